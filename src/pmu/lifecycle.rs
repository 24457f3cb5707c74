//! Starting, stopping and reading bound counters.

use super::{Pmu, PmuError};
use crate::arch::HartCounters;
use crate::event::FwEvent;
use crate::hart::HartPmu;
use crate::platform::Platform;

impl<P: Platform> Pmu<P> {
    /// Starts counter `idx` from `initial_value`.
    pub fn counter_start<H: HartCounters>(
        &self,
        hart: &mut HartPmu<H>,
        idx: usize,
        initial_value: u64,
    ) -> Result<(), PmuError> {
        let (kind, code) = self.validate_counter(hart, idx)?;

        if kind.is_firmware() {
            let state = hart.fw_event_mut(FwEvent::try_from(code)?);
            state.value = initial_value;
            state.running = true;
            return Ok(());
        }

        let mut state = hart.hw().read_state();
        if state.is_running(idx) {
            return Err(PmuError::AlreadyStarted);
        }
        hart.hw_mut().write_counter(idx, initial_value);
        state.start(idx);
        hart.hw_mut().write_state(state);
        log::trace!("Hart {}: started counter {}", hart.hart_id(), idx);
        Ok(())
    }

    /// Stops counter `idx`, releasing it if `reset` is set.
    pub fn counter_stop<H: HartCounters>(
        &self,
        hart: &mut HartPmu<H>,
        idx: usize,
        reset: bool,
    ) -> Result<(), PmuError> {
        let (kind, code) = self.validate_counter(hart, idx)?;

        if kind.is_firmware() {
            hart.fw_event_mut(FwEvent::try_from(code)?).running = false;
        } else {
            let mut state = hart.hw().read_state();
            if !state.is_running(idx) {
                return Err(PmuError::AlreadyStopped);
            }
            state.stop(idx);
            hart.hw_mut().write_state(state);
        }

        if reset {
            hart.unbind(idx);
        }
        log::trace!("Hart {}: stopped counter {} (reset: {})", hart.hart_id(), idx, reset);
        Ok(())
    }

    /// Reads the current value of counter `idx`.
    pub fn counter_read<H: HartCounters>(
        &self,
        hart: &HartPmu<H>,
        idx: usize,
    ) -> Result<u64, PmuError> {
        let (kind, code) = self.validate_counter(hart, idx)?;

        if kind.is_firmware() {
            Ok(hart.fw_event(FwEvent::try_from(code)?).value)
        } else {
            Ok(hart.hw().read_counter(idx))
        }
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use hpmux_core::counter::TIME_IDX;

    use super::*;
    use crate::event::{EventIdx, EventKind};
    use crate::pmu::tests::setup;

    #[test]
    fn cycles_scenario() {
        let (pmu, mut hart) = setup();

        let idx = pmu
            .find_and_bind_counter(&mut hart, 0, 0b1, EventIdx::CPU_CYCLES, 0)
            .unwrap();
        assert_eq!(idx, 0);

        pmu.counter_start(&mut hart, idx, 1000).unwrap();
        assert!(hart.hw().read_state().is_running(idx));
        assert_eq!(pmu.counter_read(&hart, idx), Ok(1000));
        hart.hw_mut().tick(5);
        assert_eq!(pmu.counter_read(&hart, idx), Ok(1005));

        pmu.counter_stop(&mut hart, idx, true).unwrap();
        assert!(hart.hw().read_state().is_free(idx));
        assert_eq!(hart.binding(idx), None);

        // Released, can be bound again
        assert_eq!(
            pmu.find_and_bind_counter(&mut hart, 0, 0b1, EventIdx::CPU_CYCLES, 0),
            Ok(0)
        );
    }

    #[test]
    fn double_start() {
        let (pmu, mut hart) = setup();
        let idx = pmu
            .find_and_bind_counter(&mut hart, 0, usize::MAX, EventIdx::new(3), 0)
            .unwrap();

        pmu.counter_start(&mut hart, idx, 10).unwrap();
        hart.hw_mut().tick(1);
        assert_eq!(
            pmu.counter_start(&mut hart, idx, 500),
            Err(PmuError::AlreadyStarted)
        );
        assert_eq!(pmu.counter_read(&hart, idx), Ok(11));
    }

    #[test]
    fn double_stop() {
        let (pmu, mut hart) = setup();
        let idx = pmu
            .find_and_bind_counter(&mut hart, 0, usize::MAX, EventIdx::new(3), 0)
            .unwrap();

        // Never started
        assert_eq!(
            pmu.counter_stop(&mut hart, idx, true),
            Err(PmuError::AlreadyStopped)
        );
        // The failed stop does not release the counter
        assert_eq!(hart.binding(idx), Some(EventIdx::new(3)));

        pmu.counter_start(&mut hart, idx, 0).unwrap();
        pmu.counter_stop(&mut hart, idx, false).unwrap();
        assert_eq!(
            pmu.counter_stop(&mut hart, idx, false),
            Err(PmuError::AlreadyStopped)
        );
        assert_eq!(pmu.validate_counter(&hart, idx), Ok((EventKind::Hardware, 3)));

        // Stopped but still bound, can be restarted
        pmu.counter_start(&mut hart, idx, 0).unwrap();
    }

    #[test]
    fn firmware_counter() {
        let (pmu, mut hart) = setup();
        let idx = pmu
            .find_and_bind_counter(
                &mut hart,
                0,
                usize::MAX,
                EventIdx::firmware(FwEvent::IpiReceived),
                0,
            )
            .unwrap();

        pmu.counter_start(&mut hart, idx, 40).unwrap();
        assert_eq!(pmu.counter_read(&hart, idx), Ok(40));
        hart.increment_fw_event(FwEvent::IpiReceived);
        hart.increment_fw_event(FwEvent::IpiReceived);
        hart.increment_fw_event(FwEvent::IpiReceived);
        assert_eq!(pmu.counter_read(&hart, idx), Ok(43));

        pmu.counter_stop(&mut hart, idx, false).unwrap();
        hart.increment_fw_event(FwEvent::IpiReceived);
        assert_eq!(pmu.counter_read(&hart, idx), Ok(43));
        assert_eq!(
            pmu.validate_counter(&hart, idx),
            Ok((EventKind::Firmware, FwEvent::IpiReceived as usize))
        );

        pmu.counter_stop(&mut hart, idx, true).unwrap();
        assert_eq!(pmu.counter_read(&hart, idx), Err(PmuError::InvalidArgument));
    }

    #[test]
    fn unbound_counters() {
        let (pmu, mut hart) = setup();
        for idx in [0, TIME_IDX, 3, pmu.layout().fw_counters().start, pmu.num_counters()] {
            assert_eq!(pmu.counter_start(&mut hart, idx, 0), Err(PmuError::InvalidArgument));
            assert_eq!(pmu.counter_stop(&mut hart, idx, true), Err(PmuError::InvalidArgument));
            assert_eq!(pmu.counter_read(&hart, idx), Err(PmuError::InvalidArgument));
        }
    }
}
