//! Platform hooks
//!
//! The platform decides which hardware events exist and how they are programmed in the event
//! selectors. Everything else is common to all platforms.

pub mod virt;

use crate::error::PmuError;
use crate::event::EventIdx;
use crate::registry::EventRegistry;

pub trait Platform {
    /// Registers the hardware events of the platform, called once during cold boot.
    fn pmu_init(&self, registry: &mut EventRegistry) -> Result<(), PmuError>;

    /// Returns the value to program in `mhpmevent` to count `event`, or 0 if the platform does
    /// not know how to count it. `data` is the raw selector for raw events.
    fn mhpmevent_value(&self, event: EventIdx, data: u64) -> u64;
}

/// Registers cycles and retired instructions on their dedicated counters.
pub fn register_fixed_events(registry: &mut EventRegistry) -> Result<(), PmuError> {
    registry.register_hw_event_range(EventIdx::CPU_CYCLES, EventIdx::CPU_CYCLES, 0b001)?;
    registry.register_hw_event_range(EventIdx::INSTRUCTIONS, EventIdx::INSTRUCTIONS, 0b100)
}
