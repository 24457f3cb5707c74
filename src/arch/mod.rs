//! Architecture specific functions
//!
//! All direct interaction with the RISC-V counter CSRs lives behind [HartCounters]. The allocator
//! and the lifecycle operations only ever talk to that trait, which lets us run them against the
//! simulated counters of [host::HostCounters] when testing on the host.

pub mod host;
#[cfg(all(
    any(target_arch = "riscv32", target_arch = "riscv64"),
    not(feature = "userspace")
))]
pub mod metal;

use hpmux_core::counter::HW_COUNTER_MAX;

// ——————————————————————————— Select Architecture —————————————————————————— //

/// Risc-V bare-metal M-mode counters.
#[cfg(all(
    any(target_arch = "riscv32", target_arch = "riscv64"),
    not(feature = "userspace")
))]
pub type Arch = metal::MetalCounters;

/// Simulated counters, running in userspace.
#[cfg(any(
    not(any(target_arch = "riscv32", target_arch = "riscv64")),
    feature = "userspace"
))]
pub type Arch = host::HostCounters;

// ——————————————————————————— Counter Interface ———————————————————————————— //

/// The counter registers of the current hart.
///
/// Counter indices follow the `mcycle` numbering: 0 is `mcycle`, 2 is `minstret` and `n >= 3` is
/// `mhpmcounter<n>`. Index 1 (`time`) has no machine counter behind it.
pub trait HartCounters {
    /// Returns what the hart implements.
    fn capabilities(&self) -> CounterCapabilities;

    /// Reads the `mcounteren`/`mcountinhibit` pair.
    fn read_state(&self) -> CounterState;

    /// Writes the `mcounteren`/`mcountinhibit` pair.
    fn write_state(&mut self, state: CounterState);

    /// Reads a counter, combining both halves on 32-bit harts.
    fn read_counter(&self, idx: usize) -> u64;

    /// Writes a counter, splitting the value on 32-bit harts.
    fn write_counter(&mut self, idx: usize, value: u64);

    /// Programs the `mhpmevent<idx>` selector, `idx` must be a programmable counter.
    fn write_event_selector(&mut self, idx: usize, value: u64);
}

/// Counter related capabilities of a hart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterCapabilities {
    /// Whether `mcountinhibit` is implemented.
    pub has_mcountinhibit: bool,
    /// Number of implemented `mhpmcounter` (not counting `mcycle` and `minstret`).
    pub mhpm_count: usize,
    /// Width of the `mhpmcounter` registers, in bits.
    pub mhpm_bits: usize,
}

impl CounterCapabilities {
    /// `mhpmcounter3` to `mhpmcounter31`.
    pub const MAX_MHPM_COUNT: usize = HW_COUNTER_MAX - 3;
}

// ————————————————————————————— Counter State —————————————————————————————— //

/// Enable and inhibit bitmaps, one bit per counter index.
///
/// A counter is running when it is enabled and not inhibited, and free for allocation when it is
/// disabled and inhibited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterState {
    /// `mcounteren`
    pub enabled: usize,
    /// `mcountinhibit`
    pub inhibited: usize,
}

impl CounterState {
    /// All counters stopped.
    pub fn all_stopped() -> Self {
        CounterState {
            enabled: 0,
            inhibited: u32::MAX as usize,
        }
    }

    pub fn is_running(&self, idx: usize) -> bool {
        bit(self.enabled, idx) && !bit(self.inhibited, idx)
    }

    pub fn is_free(&self, idx: usize) -> bool {
        !bit(self.enabled, idx) && bit(self.inhibited, idx)
    }

    pub fn start(&mut self, idx: usize) {
        self.enabled |= 1 << idx;
        self.inhibited &= !(1 << idx);
    }

    pub fn stop(&mut self, idx: usize) {
        self.enabled &= !(1 << idx);
        self.inhibited |= 1 << idx;
    }
}

fn bit(value: usize, idx: usize) -> bool {
    idx < HW_COUNTER_MAX && (value >> idx) & 1 == 1
}
