//! Per-hart counter state
//!
//! Each hart owns a [HartPmu]: which event is bound to which counter, the software state of the
//! firmware events, and the counter registers of the hart. Only the hart itself ever touches its
//! context, so none of this needs locking.

use hpmux_core::counter::TIME_IDX;

use crate::arch::{CounterState, HartCounters};
use crate::config::PMU_COUNTER_MAX;
use crate::error::PmuError;
use crate::event::{EventIdx, FwEvent};
use crate::pmu::CounterLayout;

/// Software state of a firmware event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FwEventState {
    /// Current value of the counter.
    pub value: u64,
    /// Whether the event is being counted.
    pub running: bool,
}

/// The PMU context of a single hart.
pub struct HartPmu<H: HartCounters> {
    hart_id: usize,
    hw: H,
    layout: CounterLayout,
    active_events: [Option<EventIdx>; PMU_COUNTER_MAX],
    fw_events: [FwEventState; FwEvent::COUNT],
}

impl<H: HartCounters> HartPmu<H> {
    pub(crate) fn new(hart_id: usize, hw: H, layout: CounterLayout) -> Self {
        HartPmu {
            hart_id,
            hw,
            layout,
            active_events: [None; PMU_COUNTER_MAX],
            fw_events: [FwEventState::default(); FwEvent::COUNT],
        }
    }

    pub fn hart_id(&self) -> usize {
        self.hart_id
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// The event bound to counter `idx`, if any.
    pub fn binding(&self, idx: usize) -> Option<EventIdx> {
        self.active_events.get(idx).copied().flatten()
    }

    pub(crate) fn bind(&mut self, idx: usize, event: EventIdx) {
        self.active_events[idx] = Some(event);
    }

    pub(crate) fn unbind(&mut self, idx: usize) {
        self.active_events[idx] = None;
    }

    pub fn fw_event(&self, event: FwEvent) -> FwEventState {
        self.fw_events[event as usize]
    }

    pub(crate) fn fw_event_mut(&mut self, event: FwEvent) -> &mut FwEventState {
        &mut self.fw_events[event as usize]
    }

    /// Records one occurrence of a firmware event, if the event is being counted.
    pub fn increment_fw_event(&mut self, event: FwEvent) {
        let state = self.fw_event_mut(event);
        if state.running {
            state.value = state.value.wrapping_add(1);
        }
    }

    /// Same as [Self::increment_fw_event], for a raw firmware event code.
    pub fn increment_firmware_event(&mut self, code: usize) -> Result<(), PmuError> {
        let event = FwEvent::try_from(code)?;
        self.increment_fw_event(event);
        Ok(())
    }

    /// Releases every counter and forgets the firmware events.
    ///
    /// The hardware counters are stopped as well, so that hardware and software agree on which
    /// counters are free.
    pub fn reset(&mut self) {
        self.active_events = [None; PMU_COUNTER_MAX];
        self.fw_events = [FwEventState::default(); FwEvent::COUNT];

        let mut state: CounterState = self.hw.read_state();
        for idx in self.layout.hw_counters().filter(|idx| *idx != TIME_IDX) {
            state.stop(idx);
        }
        self.hw.write_state(state);
        log::debug!("Reset PMU state of hart {}", self.hart_id);
    }

    /// Hart teardown, mirrors the per-hart part of the initialization.
    pub fn exit(&mut self) {
        self.reset();
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::host::HostCounters;
    use crate::arch::CounterCapabilities;

    fn hart() -> HartPmu<HostCounters> {
        let caps = CounterCapabilities {
            has_mcountinhibit: true,
            mhpm_count: 4,
            mhpm_bits: 40,
        };
        HartPmu::new(0, HostCounters::new(caps), CounterLayout::new(&caps))
    }

    #[test]
    fn increment_only_when_running() {
        let mut hart = hart();

        hart.increment_fw_event(FwEvent::SetTimer);
        assert_eq!(hart.fw_event(FwEvent::SetTimer).value, 0);

        hart.fw_event_mut(FwEvent::SetTimer).running = true;
        hart.increment_fw_event(FwEvent::SetTimer);
        hart.increment_fw_event(FwEvent::SetTimer);
        assert_eq!(hart.fw_event(FwEvent::SetTimer).value, 2);
        assert_eq!(hart.fw_event(FwEvent::IpiSent).value, 0);

        hart.fw_event_mut(FwEvent::SetTimer).running = false;
        hart.increment_fw_event(FwEvent::SetTimer);
        assert_eq!(hart.fw_event(FwEvent::SetTimer).value, 2);
    }

    #[test]
    fn increment_unknown_code() {
        let mut hart = hart();
        assert_eq!(hart.increment_firmware_event(FwEvent::COUNT), Err(PmuError::InvalidArgument));
        assert_eq!(hart.increment_firmware_event(FwEvent::IpiReceived as usize), Ok(()));
    }

    #[test]
    fn reset_clears_everything() {
        let mut hart = hart();
        hart.bind(3, EventIdx::new(3));
        hart.fw_event_mut(FwEvent::IpiSent).running = true;
        hart.fw_event_mut(FwEvent::IpiSent).value = 7;
        let mut state = CounterState::default();
        state.start(3);
        state.enabled |= 1 << TIME_IDX;
        hart.hw_mut().write_state(state);

        hart.reset();

        assert_eq!(hart.binding(3), None);
        assert_eq!(hart.fw_event(FwEvent::IpiSent), FwEventState::default());
        let state = hart.hw().read_state();
        for idx in [0, 2, 3, 4, 5, 6] {
            assert!(state.is_free(idx), "counter {idx} should be free");
        }
        // time stays readable from S-mode
        assert_eq!(state.enabled & (1 << TIME_IDX), 1 << TIME_IDX);
    }

    #[test]
    fn out_of_range_binding() {
        let hart = hart();
        assert_eq!(hart.binding(PMU_COUNTER_MAX + 3), None);
    }
}
