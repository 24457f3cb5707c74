//! Counter allocation
//!
//! Finds a free counter able to count an event, programs its event selector and binds it to the
//! event. A counter is free when it is both stopped in hardware and unbound in the hart context.

use hpmux_core::counter::{FIRST_HPM_IDX, HW_COUNTER_MAX};

use super::{Pmu, PmuError};
use crate::arch::HartCounters;
use crate::event::{EventIdx, FwEvent};
use crate::hart::HartPmu;
use crate::platform::Platform;

impl<P: Platform> Pmu<P> {
    /// Binds a counter to `event` and returns its index.
    ///
    /// Only counters `base + i` where bit `i` of `mask` is set are considered. For raw events
    /// `data` is the raw selector, it is ignored otherwise.
    pub fn find_and_bind_counter<H: HartCounters>(
        &self,
        hart: &mut HartPmu<H>,
        base: usize,
        mask: usize,
        event: EventIdx,
        data: u64,
    ) -> Result<usize, PmuError> {
        if base >= self.layout.total_counters {
            return Err(PmuError::InvalidArgument);
        }

        let idx = if event.kind()?.is_firmware() {
            FwEvent::try_from(event.code())?;
            self.find_fw_counter(hart, base, mask)?
        } else {
            let idx = self.find_hw_counter(hart, base, mask, event, data)?;
            if !event.is_fixed() {
                self.program_selector(hart, idx, event, data)?;
            }
            idx
        };

        hart.bind(idx, event);
        log::debug!(
            "Hart {}: counter {} bound to event 0x{:x}",
            hart.hart_id(),
            idx,
            event.raw_value()
        );
        Ok(idx)
    }

    fn find_fw_counter<H: HartCounters>(
        &self,
        hart: &HartPmu<H>,
        base: usize,
        mask: usize,
    ) -> Result<usize, PmuError> {
        let first = base.max(self.layout.fw_counters().start);
        (first..self.layout.total_counters)
            .find(|&idx| in_mask(base, mask, idx) && hart.binding(idx).is_none())
            .ok_or(PmuError::Unsupported)
    }

    /// Descriptors are tried in registration order, the lowest usable counter of the first
    /// descriptor with one wins.
    fn find_hw_counter<H: HartCounters>(
        &self,
        hart: &HartPmu<H>,
        base: usize,
        mask: usize,
        event: EventIdx,
        data: u64,
    ) -> Result<usize, PmuError> {
        let state = hart.hw().read_state();
        let last = self.layout.num_hw_counters.min(HW_COUNTER_MAX - 1);

        for desc in self.registry.candidates(event, data) {
            let found = (base..=last).find(|&idx| {
                desc.counters & (1 << idx) != 0
                    && in_mask(base, mask, idx)
                    && state.is_free(idx)
                    && hart.binding(idx).is_none()
            });
            if let Some(idx) = found {
                return Ok(idx);
            }
        }

        log::debug!("No counter available for event 0x{:x}", event.raw_value());
        Err(PmuError::Unsupported)
    }

    fn program_selector<H: HartCounters>(
        &self,
        hart: &mut HartPmu<H>,
        idx: usize,
        event: EventIdx,
        data: u64,
    ) -> Result<(), PmuError> {
        let value = self.platform.mhpmevent_value(event, data);
        if value == 0 || idx < FIRST_HPM_IDX || idx >= HW_COUNTER_MAX {
            log::warn!(
                "Can not program event 0x{:x} on counter {}",
                event.raw_value(),
                idx
            );
            return Err(PmuError::Failed);
        }
        hart.hw_mut().write_event_selector(idx, value);
        Ok(())
    }
}

/// Whether counter `idx` is selected by `mask`, relative to `base`.
fn in_mask(base: usize, mask: usize, idx: usize) -> bool {
    let Some(offset) = idx.checked_sub(base) else {
        return false;
    };
    offset < usize::BITS as usize && (mask >> offset) & 1 == 1
}

// ————————————————————————————————— Tests —————————————————————————————————— //
