//! Bare metal RISC-V counters
//!
//! The counter CSRs can only be addressed by immediate CSR numbers, hence the macros below which
//! expand to one `csrr`/`csrw` per counter index.

use core::arch::asm;

use super::{CounterCapabilities, CounterState, HartCounters};

/// Expands to a `match` over the programmable counter indices, with one CSR access per arm.
macro_rules! hpm_match {
    (@arms $idx:expr, csrr, $name:literal, $suffix:literal, $reg:ident, $($n:literal),+) => {
        match $idx {
            $($n => asm!(concat!("csrr {}, ", $name, stringify!($n), $suffix), out(reg) $reg),)+
            _ => $reg = 0,
        }
    };
    (@arms $idx:expr, csrw, $name:literal, $suffix:literal, $reg:ident, $($n:literal),+) => {
        match $idx {
            $($n => asm!(concat!("csrw ", $name, stringify!($n), $suffix, ", {}"), in(reg) $reg),)+
            _ => (),
        }
    };
    ($idx:expr, $insn:ident, $name:literal, $suffix:literal, $reg:ident) => {
        hpm_match!(@arms $idx, $insn, $name, $suffix, $reg,
            3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
            26, 27, 28, 29, 30, 31)
    };
}

/// The counters of the hart we are running on.
pub struct MetalCounters {
    caps: CounterCapabilities,
}

impl MetalCounters {
    /// Wraps the counters of the current hart.
    ///
    /// # Safety
    ///
    /// Must run in M-mode, and `caps` must describe the current hart: reading or writing a counter
    /// CSR that is not implemented raises an illegal instruction exception.
    pub unsafe fn new(caps: CounterCapabilities) -> Self {
        MetalCounters { caps }
    }

    fn read_low(idx: usize) -> usize {
        let value: usize;
        unsafe {
            match idx {
                0 => asm!("csrr {}, mcycle", out(reg) value),
                2 => asm!("csrr {}, minstret", out(reg) value),
                _ => hpm_match!(idx, csrr, "mhpmcounter", "", value),
            }
        }
        value
    }

    fn write_low(idx: usize, value: usize) {
        unsafe {
            match idx {
                0 => asm!("csrw mcycle, {}", in(reg) value),
                2 => asm!("csrw minstret, {}", in(reg) value),
                _ => hpm_match!(idx, csrw, "mhpmcounter", "", value),
            }
        }
    }

    #[cfg(target_arch = "riscv32")]
    fn read_high(idx: usize) -> usize {
        let value: usize;
        unsafe {
            match idx {
                0 => asm!("csrr {}, mcycleh", out(reg) value),
                2 => asm!("csrr {}, minstreth", out(reg) value),
                _ => hpm_match!(idx, csrr, "mhpmcounter", "h", value),
            }
        }
        value
    }

    #[cfg(target_arch = "riscv32")]
    fn write_high(idx: usize, value: usize) {
        unsafe {
            match idx {
                0 => asm!("csrw mcycleh, {}", in(reg) value),
                2 => asm!("csrw minstreth, {}", in(reg) value),
                _ => hpm_match!(idx, csrw, "mhpmcounter", "h", value),
            }
        }
    }
}

impl HartCounters for MetalCounters {
    fn capabilities(&self) -> CounterCapabilities {
        self.caps
    }

    fn read_state(&self) -> CounterState {
        let enabled: usize;
        let inhibited: usize;
        unsafe {
            asm!("csrr {}, mcounteren", out(reg) enabled);
            asm!("csrr {}, mcountinhibit", out(reg) inhibited);
        }
        CounterState { enabled, inhibited }
    }

    fn write_state(&mut self, state: CounterState) {
        unsafe {
            asm!("csrw mcounteren, {}", in(reg) state.enabled);
            asm!("csrw mcountinhibit, {}", in(reg) state.inhibited);
        }
    }

    #[cfg(target_arch = "riscv64")]
    fn read_counter(&self, idx: usize) -> u64 {
        Self::read_low(idx) as u64
    }

    #[cfg(target_arch = "riscv32")]
    fn read_counter(&self, idx: usize) -> u64 {
        // Re-read if the low half wrapped while reading the high half
        loop {
            let high = Self::read_high(idx);
            let low = Self::read_low(idx);
            if Self::read_high(idx) == high {
                return ((high as u64) << 32) | low as u64;
            }
        }
    }

    #[cfg(target_arch = "riscv64")]
    fn write_counter(&mut self, idx: usize, value: u64) {
        Self::write_low(idx, value as usize);
    }

    #[cfg(target_arch = "riscv32")]
    fn write_counter(&mut self, idx: usize, value: u64) {
        // Clear the low half first so that the high half can not be bumped by a carry
        Self::write_low(idx, 0);
        Self::write_high(idx, (value >> 32) as usize);
        Self::write_low(idx, value as usize);
    }

    fn write_event_selector(&mut self, idx: usize, value: u64) {
        // TODO: program mhpmevent<n>h on RV32 once Sscofpmf is supported.
        let value = value as usize;
        unsafe { hpm_match!(idx, csrw, "mhpmevent", "", value) }
    }
}
