//! Event indices
//!
//! The supervisor names what it wants to count with an event index, see
//! [hpmux_core::event] for the bit layout.

use hpmux_core::event;

use crate::error::PmuError;

// ——————————————————————————————— Event Kind ——————————————————————————————— //

/// The type field of an event index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Hardware,
    HardwareCache,
    HardwareRaw,
    Firmware,
}

impl EventKind {
    pub fn is_firmware(self) -> bool {
        self == EventKind::Firmware
    }
}

// ——————————————————————————————— Event Index —————————————————————————————— //

/// A logical event identifier, as passed by the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventIdx(usize);

impl EventIdx {
    /// The event index shared by all raw events.
    pub const RAW: EventIdx = EventIdx(event::RAW_IDX);
    pub const CPU_CYCLES: EventIdx = EventIdx(event::make(event::TYPE_HW, event::hw::CPU_CYCLES));
    pub const INSTRUCTIONS: EventIdx =
        EventIdx(event::make(event::TYPE_HW, event::hw::INSTRUCTIONS));

    pub const fn new(value: usize) -> Self {
        EventIdx(value)
    }

    /// A firmware event index for the given firmware event.
    pub const fn firmware(fw: FwEvent) -> Self {
        EventIdx(event::make(event::TYPE_FW, fw as usize))
    }

    pub const fn raw_value(self) -> usize {
        self.0
    }

    /// Decodes the type field.
    pub fn kind(self) -> Result<EventKind, PmuError> {
        match (self.0 & event::TYPE_MASK) >> event::TYPE_OFFSET {
            event::TYPE_HW => Ok(EventKind::Hardware),
            event::TYPE_HW_CACHE => Ok(EventKind::HardwareCache),
            event::TYPE_HW_RAW => Ok(EventKind::HardwareRaw),
            event::TYPE_FW => Ok(EventKind::Firmware),
            _ => Err(PmuError::InvalidArgument),
        }
    }

    pub fn code(self) -> usize {
        self.0 & event::CODE_MASK
    }

    pub fn is_raw(self) -> bool {
        self == EventIdx::RAW
    }

    /// Cycles and retired instructions live in dedicated counters with no event selector.
    pub fn is_fixed(self) -> bool {
        self == EventIdx::CPU_CYCLES || self == EventIdx::INSTRUCTIONS
    }
}

// ————————————————————————————— Firmware Events ———————————————————————————— //

/// Events counted by the firmware itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum FwEvent {
    MisalignedLoad = event::fw::MISALIGNED_LOAD,
    MisalignedStore = event::fw::MISALIGNED_STORE,
    AccessLoad = event::fw::ACCESS_LOAD,
    AccessStore = event::fw::ACCESS_STORE,
    IllegalInsn = event::fw::ILLEGAL_INSN,
    SetTimer = event::fw::SET_TIMER,
    IpiSent = event::fw::IPI_SENT,
    IpiReceived = event::fw::IPI_RECVD,
    FenceISent = event::fw::FENCE_I_SENT,
    FenceIReceived = event::fw::FENCE_I_RECVD,
    SfenceVmaSent = event::fw::SFENCE_VMA_SENT,
    SfenceVmaReceived = event::fw::SFENCE_VMA_RCVD,
    SfenceVmaAsidSent = event::fw::SFENCE_VMA_ASID_SENT,
    SfenceVmaAsidReceived = event::fw::SFENCE_VMA_ASID_RCVD,
    HfenceGvmaSent = event::fw::HFENCE_GVMA_SENT,
    HfenceGvmaReceived = event::fw::HFENCE_GVMA_RCVD,
    HfenceGvmaVmidSent = event::fw::HFENCE_GVMA_VMID_SENT,
    HfenceGvmaVmidReceived = event::fw::HFENCE_GVMA_VMID_RCVD,
    HfenceVvmaSent = event::fw::HFENCE_VVMA_SENT,
    HfenceVvmaReceived = event::fw::HFENCE_VVMA_RCVD,
    HfenceVvmaAsidSent = event::fw::HFENCE_VVMA_ASID_SENT,
    HfenceVvmaAsidReceived = event::fw::HFENCE_VVMA_ASID_RCVD,
}

impl FwEvent {
    pub const COUNT: usize = event::fw::MAX;
}

impl TryFrom<usize> for FwEvent {
    type Error = PmuError;

    fn try_from(code: usize) -> Result<Self, Self::Error> {
        use FwEvent::*;

        const ALL: [FwEvent; FwEvent::COUNT] = [
            MisalignedLoad,
            MisalignedStore,
            AccessLoad,
            AccessStore,
            IllegalInsn,
            SetTimer,
            IpiSent,
            IpiReceived,
            FenceISent,
            FenceIReceived,
            SfenceVmaSent,
            SfenceVmaReceived,
            SfenceVmaAsidSent,
            SfenceVmaAsidReceived,
            HfenceGvmaSent,
            HfenceGvmaReceived,
            HfenceGvmaVmidSent,
            HfenceGvmaVmidReceived,
            HfenceVvmaSent,
            HfenceVvmaReceived,
            HfenceVvmaAsidSent,
            HfenceVvmaAsidReceived,
        ];

        ALL.get(code).copied().ok_or(PmuError::InvalidArgument)
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
