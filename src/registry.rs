//! Hardware event registry
//!
//! The registry maps logical hardware events (ranges of event indices, or raw selectors) to the
//! physical counters able to count them. It is filled once during cold boot, from the platform
//! description, and only read afterward.

use hpmux_core::counter::{CYCLE_IDX, FIRST_HPM_IDX, INSTRET_IDX};

use crate::config::PMU_HW_EVENT_MAX;
use crate::error::PmuError;
use crate::event::EventIdx;

/// Counters reserved for the fixed events: mcycle, time and minstret.
const FIXED_COUNTERS_MASK: u32 = (1 << FIRST_HPM_IDX) - 1;

// ————————————————————————————— Event Descriptor ——————————————————————————— //

/// A mapping from a range of events to the counters that can count them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HwEventDescriptor {
    /// First event of the range, inclusive.
    pub start_idx: EventIdx,
    /// Last event of the range, inclusive.
    pub end_idx: EventIdx,
    /// Bitmap of the counters able to count the events.
    pub counters: u32,
    /// Raw selector, only meaningful for raw events.
    pub select: u64,
}

impl HwEventDescriptor {
    const EMPTY: HwEventDescriptor = HwEventDescriptor {
        start_idx: EventIdx::new(0),
        end_idx: EventIdx::new(0),
        counters: 0,
        select: 0,
    };

    pub fn is_raw(&self) -> bool {
        self.start_idx.is_raw()
    }

    pub fn contains(&self, event: EventIdx) -> bool {
        self.start_idx.raw_value() <= event.raw_value()
            && event.raw_value() <= self.end_idx.raw_value()
    }

    /// Two ranges overlap unless one lies entirely before the other.
    fn overlaps(&self, other: &HwEventDescriptor) -> bool {
        !(self.end_idx.raw_value() < other.start_idx.raw_value()
            || self.start_idx.raw_value() > other.end_idx.raw_value())
    }

    /// Whether this descriptor can implement `event`, `data` being the raw selector for raw
    /// events.
    pub fn matches(&self, event: EventIdx, data: u64) -> bool {
        if event.is_raw() {
            self.is_raw() && self.select == data
        } else {
            !self.is_raw() && self.contains(event)
        }
    }
}

// ———————————————————————————————— Registry ———————————————————————————————— //

/// The set of hardware event descriptors, with a fixed capacity.
pub struct EventRegistry {
    events: [HwEventDescriptor; PMU_HW_EVENT_MAX],
    len: usize,
}

impl EventRegistry {
    pub const fn new() -> Self {
        EventRegistry {
            events: [HwEventDescriptor::EMPTY; PMU_HW_EVENT_MAX],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &HwEventDescriptor> {
        self.events[..self.len].iter()
    }

    /// Returns the descriptors able to implement `event`, in registration order.
    pub fn candidates(&self, event: EventIdx, data: u64) -> impl Iterator<Item = &HwEventDescriptor> {
        self.iter().filter(move |desc| desc.matches(event, data))
    }

    /// Registers the counters able to count the events in `[start_idx, end_idx]`.
    pub fn register_hw_event_range(
        &mut self,
        start_idx: EventIdx,
        end_idx: EventIdx,
        counters: u32,
    ) -> Result<(), PmuError> {
        if start_idx.raw_value() > end_idx.raw_value() || start_idx.is_raw() || end_idx.is_raw() {
            log::warn!(
                "Invalid event range 0x{:x}-0x{:x}",
                start_idx.raw_value(),
                end_idx.raw_value()
            );
            return Err(PmuError::InvalidArgument);
        }

        let desc = HwEventDescriptor {
            start_idx,
            end_idx,
            counters,
            select: 0,
        };
        check_reserved_counters(&desc)?;
        self.check_capacity()?;

        if let Some(other) = self.iter().find(|other| !other.is_raw() && other.overlaps(&desc)) {
            log::warn!(
                "Event range 0x{:x}-0x{:x} overlaps with 0x{:x}-0x{:x}",
                start_idx.raw_value(),
                end_idx.raw_value(),
                other.start_idx.raw_value(),
                other.end_idx.raw_value()
            );
            return Err(PmuError::Conflict);
        }

        self.push(desc);
        Ok(())
    }

    /// Registers the counters able to count the raw event with selector `select`.
    pub fn register_raw_event(&mut self, select: u64, counters: u32) -> Result<(), PmuError> {
        let desc = HwEventDescriptor {
            start_idx: EventIdx::RAW,
            end_idx: EventIdx::RAW,
            counters,
            select,
        };
        check_reserved_counters(&desc)?;
        self.check_capacity()?;

        if self.iter().any(|other| other.is_raw() && other.select == select) {
            log::warn!("Raw event 0x{:x} is already registered", select);
            return Err(PmuError::Conflict);
        }

        self.push(desc);
        Ok(())
    }

    fn check_capacity(&self) -> Result<(), PmuError> {
        if self.len >= PMU_HW_EVENT_MAX {
            log::warn!("Can not handle more than {} hardware events", PMU_HW_EVENT_MAX);
            return Err(PmuError::ResourceExhausted);
        }
        Ok(())
    }

    fn push(&mut self, desc: HwEventDescriptor) {
        log::debug!(
            "Registered events 0x{:x}-0x{:x} on counters 0b{:b}",
            desc.start_idx.raw_value(),
            desc.end_idx.raw_value(),
            desc.counters
        );
        self.events[self.len] = desc;
        self.len += 1;
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Cycles go to mcycle only, instructions to minstret only, and nothing else may claim the fixed
/// counters.
fn check_reserved_counters(desc: &HwEventDescriptor) -> Result<(), PmuError> {
    let single = |event: EventIdx| desc.start_idx == event && desc.end_idx == event;

    let allowed = if desc.contains(EventIdx::CPU_CYCLES) {
        single(EventIdx::CPU_CYCLES) && desc.counters == 1 << CYCLE_IDX
    } else if desc.contains(EventIdx::INSTRUCTIONS) {
        single(EventIdx::INSTRUCTIONS) && desc.counters == 1 << INSTRET_IDX
    } else {
        desc.counters & FIXED_COUNTERS_MASK == 0
    };

    if allowed {
        Ok(())
    } else {
        log::warn!(
            "Events 0x{:x}-0x{:x} can not use counters 0b{:b}",
            desc.start_idx.raw_value(),
            desc.end_idx.raw_value(),
            desc.counters
        );
        Err(PmuError::PermissionDenied)
    }
}

// —————————————————————————— Event Selector Table —————————————————————————— //

/// Board specific selector values for standard hardware events.
///
/// Filled from the boot configuration before events are registered, and consulted when computing
/// the value to program in `mhpmevent`.
pub struct EventSelectTable {
    entries: [(EventIdx, u64); PMU_HW_EVENT_MAX],
    len: usize,
}

impl EventSelectTable {
    pub const fn new() -> Self {
        EventSelectTable {
            entries: [(EventIdx::new(0), 0); PMU_HW_EVENT_MAX],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, event: EventIdx, select: u64) -> Result<(), PmuError> {
        if self.len >= PMU_HW_EVENT_MAX {
            log::warn!("Can not hold more than {} event selectors", PMU_HW_EVENT_MAX);
            return Err(PmuError::ResourceExhausted);
        }
        self.entries[self.len] = (event, select);
        self.len += 1;
        Ok(())
    }

    /// Returns the selector of `event`, or 0 if it has none.
    pub fn lookup_select(&self, event: EventIdx) -> u64 {
        self.entries[..self.len]
            .iter()
            .find(|(idx, _)| *idx == event)
            .map(|(_, select)| *select)
            .unwrap_or(0)
    }
}

impl Default for EventSelectTable {
    fn default() -> Self {
        Self::new()
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;

    const CYCLES: EventIdx = EventIdx::CPU_CYCLES;
    const INSTRUCTIONS: EventIdx = EventIdx::INSTRUCTIONS;

    fn ev(idx: usize) -> EventIdx {
        EventIdx::new(idx)
    }

    #[test]
    fn fixed_events_policy() {
        let mut registry = EventRegistry::new();

        assert_eq!(
            registry.register_hw_event_range(CYCLES, CYCLES, 0b0011),
            Err(PmuError::PermissionDenied)
        );
        assert_eq!(
            registry.register_hw_event_range(CYCLES, CYCLES, 0b1000),
            Err(PmuError::PermissionDenied)
        );
        assert_eq!(
            registry.register_hw_event_range(INSTRUCTIONS, INSTRUCTIONS, 0b0001),
            Err(PmuError::PermissionDenied)
        );
        // A range swallowing a fixed event is refused too
        assert_eq!(
            registry.register_hw_event_range(ev(0), ev(5), 0b1000),
            Err(PmuError::PermissionDenied)
        );
        // Other events can't claim the fixed counters
        assert_eq!(
            registry.register_hw_event_range(ev(3), ev(3), 0b1100),
            Err(PmuError::PermissionDenied)
        );
        assert_eq!(registry.register_raw_event(0x42, 0b0010), Err(PmuError::PermissionDenied));
        assert!(registry.is_empty());

        assert_eq!(registry.register_hw_event_range(CYCLES, CYCLES, 0b0001), Ok(()));
        assert_eq!(registry.register_hw_event_range(INSTRUCTIONS, INSTRUCTIONS, 0b0100), Ok(()));
        assert_eq!(registry.register_hw_event_range(ev(3), ev(4), 0b1000), Ok(()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn malformed_ranges() {
        let mut registry = EventRegistry::new();
        assert_eq!(
            registry.register_hw_event_range(ev(5), ev(4), 0b1000),
            Err(PmuError::InvalidArgument)
        );
        assert_eq!(
            registry.register_hw_event_range(EventIdx::RAW, EventIdx::RAW, 0b1000),
            Err(PmuError::InvalidArgument)
        );
        assert_eq!(
            registry.register_hw_event_range(ev(3), EventIdx::RAW, 0b1000),
            Err(PmuError::InvalidArgument)
        );
    }

    #[test]
    fn overlapping_ranges() {
        let mut registry = EventRegistry::new();
        assert_eq!(registry.register_hw_event_range(ev(5), ev(10), 0b1000), Ok(()));

        for (start, end) in [(5, 10), (3, 5), (10, 12), (6, 7), (4, 11)] {
            assert_eq!(
                registry.register_hw_event_range(ev(start), ev(end), 0b10000),
                Err(PmuError::Conflict),
                "{start}-{end} should overlap with 5-10"
            );
        }

        assert_eq!(registry.register_hw_event_range(ev(3), ev(4), 0b10000), Ok(()));
        assert_eq!(registry.register_hw_event_range(ev(11), ev(11), 0b10000), Ok(()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_raw_selectors() {
        let mut registry = EventRegistry::new();
        assert_eq!(registry.register_raw_event(0x1234, 0b1000), Ok(()));
        assert_eq!(registry.register_raw_event(0x1234, 0b10000), Err(PmuError::Conflict));
        assert_eq!(registry.register_raw_event(0x1235, 0b10000), Ok(()));
        // Raw events don't collide with ranges
        assert_eq!(registry.register_hw_event_range(ev(3), ev(3), 0b1000), Ok(()));
        assert_eq!(registry.register_raw_event(0, 0b1000), Ok(()));
    }

    #[test]
    fn capacity() {
        let mut registry = EventRegistry::new();
        for i in 0..PMU_HW_EVENT_MAX {
            assert_eq!(registry.register_raw_event(i as u64, 0b1000), Ok(()));
        }
        assert_eq!(
            registry.register_raw_event(PMU_HW_EVENT_MAX as u64, 0b1000),
            Err(PmuError::ResourceExhausted)
        );
        assert_eq!(
            registry.register_hw_event_range(ev(3), ev(3), 0b1000),
            Err(PmuError::ResourceExhausted)
        );
    }

    #[test]
    fn candidates() {
        let mut registry = EventRegistry::new();
        registry.register_hw_event_range(ev(3), ev(6), 0b1000).unwrap();
        registry.register_raw_event(0xabc, 0b10000).unwrap();
        registry.register_raw_event(0xdef, 0b100000).unwrap();

        let found: Vec<u32> = registry.candidates(ev(4), 0).map(|d| d.counters).collect();
        assert_eq!(found, [0b1000]);

        let found: Vec<u32> = registry
            .candidates(EventIdx::RAW, 0xdef)
            .map(|d| d.counters)
            .collect();
        assert_eq!(found, [0b100000]);

        assert_eq!(registry.candidates(ev(99), 0).count(), 0);
        assert_eq!(registry.candidates(EventIdx::RAW, 0x1).count(), 0);
    }

    #[test]
    fn select_lookup() {
        let mut table = EventSelectTable::new();
        assert_eq!(table.lookup_select(ev(3)), 0);

        table.insert(ev(3), 0x1_0000_0019).unwrap();
        table.insert(ev(5), 0x42).unwrap();
        assert_eq!(table.lookup_select(ev(3)), 0x1_0000_0019);
        assert_eq!(table.lookup_select(ev(5)), 0x42);
        assert_eq!(table.lookup_select(ev(4)), 0);
        assert_eq!(table.len(), 2);
    }
}
