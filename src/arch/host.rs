//! Simulated counters, used when running on the host.
//!
//! The counters don't tick on their own, use [HostCounters::tick] to simulate events.

use hpmux_core::counter::{FIRST_HPM_IDX, HW_COUNTER_MAX, TIME_IDX};

use super::{CounterCapabilities, CounterState, HartCounters};

/// A simulated register file for the counters of one hart.
#[derive(Clone, Debug)]
pub struct HostCounters {
    caps: CounterCapabilities,
    state: CounterState,
    counters: [u64; HW_COUNTER_MAX],
    selectors: [u64; HW_COUNTER_MAX],
}

impl HostCounters {
    pub fn new(caps: CounterCapabilities) -> Self {
        HostCounters {
            caps,
            state: CounterState::default(),
            counters: [0; HW_COUNTER_MAX],
            selectors: [0; HW_COUNTER_MAX],
        }
    }

    /// Simulates `n` occurrences of the events counted by every running counter.
    pub fn tick(&mut self, n: u64) {
        for idx in 0..HW_COUNTER_MAX {
            if self.state.is_running(idx) {
                self.counters[idx] = self.counters[idx].wrapping_add(n);
            }
        }
    }

    /// The value last programmed into `mhpmevent<idx>`.
    pub fn event_selector(&self, idx: usize) -> u64 {
        self.selectors[idx]
    }

    fn implemented(&self, idx: usize) -> bool {
        idx < FIRST_HPM_IDX + self.caps.mhpm_count.min(CounterCapabilities::MAX_MHPM_COUNT)
            && idx != TIME_IDX
    }
}

impl HartCounters for HostCounters {
    fn capabilities(&self) -> CounterCapabilities {
        self.caps
    }

    fn read_state(&self) -> CounterState {
        self.state
    }

    fn write_state(&mut self, state: CounterState) {
        self.state = state;
        if !self.caps.has_mcountinhibit {
            // mcountinhibit is read-only zero when not implemented
            self.state.inhibited = 0;
        }
    }

    fn read_counter(&self, idx: usize) -> u64 {
        if self.implemented(idx) {
            self.counters[idx]
        } else {
            0
        }
    }

    fn write_counter(&mut self, idx: usize, value: u64) {
        if self.implemented(idx) {
            self.counters[idx] = value;
        }
    }

    fn write_event_selector(&mut self, idx: usize, value: u64) {
        if idx >= FIRST_HPM_IDX && self.implemented(idx) {
            self.selectors[idx] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> CounterCapabilities {
        CounterCapabilities {
            has_mcountinhibit: true,
            mhpm_count: 2,
            mhpm_bits: 48,
        }
    }

    #[test]
    fn only_running_counters_tick() {
        let mut hw = HostCounters::new(caps());
        let mut state = CounterState::all_stopped();
        state.start(3);
        hw.write_state(state);
        hw.write_counter(0, 10);
        hw.write_counter(3, 10);

        hw.tick(5);
        assert_eq!(hw.read_counter(0), 10);
        assert_eq!(hw.read_counter(3), 15);
    }

    #[test]
    fn unimplemented_counters_read_zero() {
        let mut hw = HostCounters::new(caps());
        hw.write_counter(TIME_IDX, 42);
        hw.write_counter(5, 42);
        hw.write_event_selector(5, 0x11);
        assert_eq!(hw.read_counter(TIME_IDX), 0);
        assert_eq!(hw.read_counter(5), 0);
        assert_eq!(hw.event_selector(5), 0);
    }

    #[test]
    fn missing_inhibit_reads_zero() {
        let mut hw = HostCounters::new(CounterCapabilities {
            has_mcountinhibit: false,
            ..caps()
        });
        hw.write_state(CounterState::all_stopped());
        assert_eq!(hw.read_state().inhibited, 0);
    }
}
