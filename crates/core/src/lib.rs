//! Hpmux core definitions
//!
//! This crate purpose is to hold the ABI constants shared by the performance counter firmware and
//! by anything that talks to it (payloads, test harnesses, tooling). It does not hold any code
//! besides trivial `const fn` helpers, so it can be used from any context.

#![no_std]

// ———————————————————————————— SBI Return Codes ———————————————————————————— //

/// SBI return codes, as defined by the SBI specification.
///
/// See: https://github.com/riscv-non-isa/riscv-sbi-doc
pub mod sbi_codes {
    pub const SBI_SUCCESS: isize = 0;
    pub const SBI_ERR_FAILED: isize = -1;
    pub const SBI_ERR_NOT_SUPPORTED: isize = -2;
    pub const SBI_ERR_INVALID_PARAM: isize = -3;
    pub const SBI_ERR_DENIED: isize = -4;
    pub const SBI_ERR_INVALID_ADDRESS: isize = -5;
    pub const SBI_ERR_ALREADY_AVAILABLE: isize = -6;
    pub const SBI_ERR_ALREADY_STARTED: isize = -7;
    pub const SBI_ERR_ALREADY_STOPPED: isize = -8;
}

// ——————————————————————————— PMU Extension ABI ———————————————————————————— //

/// The SBI Performance Monitoring Unit extension.
pub mod pmu {
    /// PMU extension ID ("PMU" in ASCII).
    pub const SBI_PMU_EID: usize = 0x504D55;

    /// Returns the number of counters, both hardware and firmware.
    pub const NUM_COUNTERS_FID: usize = 0;
    /// Returns the packed description of a counter.
    pub const COUNTER_GET_INFO_FID: usize = 1;
    /// Finds and configures a counter matching an event.
    pub const COUNTER_CFG_MATCH_FID: usize = 2;
    /// Starts a counter with an initial value.
    pub const COUNTER_START_FID: usize = 3;
    /// Stops a counter, optionally releasing it.
    pub const COUNTER_STOP_FID: usize = 4;
    /// Reads the current value of a firmware counter.
    pub const COUNTER_FW_READ_FID: usize = 5;
}

// ——————————————————————————— Event Index Layout ——————————————————————————— //

/// Layout of the event index passed by the supervisor.
///
/// ```text
///  19      16 15                     0
/// +----------+------------------------+
/// |   type   |          code          |
/// +----------+------------------------+
/// ```
pub mod event {
    pub const TYPE_OFFSET: usize = 16;
    pub const TYPE_MASK: usize = 0xF << TYPE_OFFSET;
    pub const CODE_MASK: usize = 0xFFFF;

    /// Generic hardware events.
    pub const TYPE_HW: usize = 0x0;
    /// Hardware cache events.
    pub const TYPE_HW_CACHE: usize = 0x1;
    /// Raw, platform specific, hardware events.
    pub const TYPE_HW_RAW: usize = 0x2;
    /// Firmware events.
    pub const TYPE_FW: usize = 0xF;

    /// All raw events share this single event index, the selector is passed as event data.
    pub const RAW_IDX: usize = TYPE_HW_RAW << TYPE_OFFSET;

    /// Generic hardware event codes (type 0).
    pub mod hw {
        pub const NO_EVENT: usize = 0;
        pub const CPU_CYCLES: usize = 1;
        pub const INSTRUCTIONS: usize = 2;
        pub const CACHE_REFERENCES: usize = 3;
        pub const CACHE_MISSES: usize = 4;
        pub const BRANCH_INSTRUCTIONS: usize = 5;
        pub const BRANCH_MISSES: usize = 6;
        pub const BUS_CYCLES: usize = 7;
        pub const STALLED_CYCLES_FRONTEND: usize = 8;
        pub const STALLED_CYCLES_BACKEND: usize = 9;
        pub const REF_CPU_CYCLES: usize = 10;
    }

    /// Firmware event codes (type 15).
    pub mod fw {
        pub const MISALIGNED_LOAD: usize = 0;
        pub const MISALIGNED_STORE: usize = 1;
        pub const ACCESS_LOAD: usize = 2;
        pub const ACCESS_STORE: usize = 3;
        pub const ILLEGAL_INSN: usize = 4;
        pub const SET_TIMER: usize = 5;
        pub const IPI_SENT: usize = 6;
        pub const IPI_RECVD: usize = 7;
        pub const FENCE_I_SENT: usize = 8;
        pub const FENCE_I_RECVD: usize = 9;
        pub const SFENCE_VMA_SENT: usize = 10;
        pub const SFENCE_VMA_RCVD: usize = 11;
        pub const SFENCE_VMA_ASID_SENT: usize = 12;
        pub const SFENCE_VMA_ASID_RCVD: usize = 13;
        pub const HFENCE_GVMA_SENT: usize = 14;
        pub const HFENCE_GVMA_RCVD: usize = 15;
        pub const HFENCE_GVMA_VMID_SENT: usize = 16;
        pub const HFENCE_GVMA_VMID_RCVD: usize = 17;
        pub const HFENCE_VVMA_SENT: usize = 18;
        pub const HFENCE_VVMA_RCVD: usize = 19;
        pub const HFENCE_VVMA_ASID_SENT: usize = 20;
        pub const HFENCE_VVMA_ASID_RCVD: usize = 21;
        /// Number of defined firmware events.
        pub const MAX: usize = 22;
    }

    /// Builds an event index from its type and code.
    pub const fn make(ty: usize, code: usize) -> usize {
        ((ty << TYPE_OFFSET) & TYPE_MASK) | (code & CODE_MASK)
    }
}

// —————————————————————————————— Counter CSRs —————————————————————————————— //

/// CSR numbers of the counter registers.
///
/// The machine counters are only accessed through `csrr`/`csrw` with immediate CSR names, only the
/// user-visible numbering is part of the ABI.
pub mod csr {
    /// Unprivileged `cycle`, counter `n` is at `CYCLE + n`.
    pub const CYCLE: usize = 0xC00;
}

// ——————————————————————————————— Counters ————————————————————————————————— //

/// Physical counter indices with an architectural meaning.
pub mod counter {
    /// `mcycle`
    pub const CYCLE_IDX: usize = 0;
    /// `time` is memory mapped in M-mode, that counter index is never mappable.
    pub const TIME_IDX: usize = 1;
    /// `minstret`
    pub const INSTRET_IDX: usize = 2;
    /// First programmable counter (`mhpmcounter3`).
    pub const FIRST_HPM_IDX: usize = 3;
    /// Number of architectural hardware counter slots.
    pub const HW_COUNTER_MAX: usize = 32;

    /// Counter type bit of the counter info word.
    pub const INFO_TYPE_HW: usize = 0;
    pub const INFO_TYPE_FW: usize = 1;
}
