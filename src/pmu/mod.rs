//! The SBI PMU counter layer
//!
//! [Pmu] holds the state shared by all harts: the platform and the registry of hardware events,
//! both frozen after the cold boot initialization. Everything that changes at runtime lives in the
//! [HartPmu] of each hart.
//!
//! Counter indices exposed to the supervisor are laid out as follows:
//!
//! ```text
//! 0      1      2          3 ..= num_hw_counters       num_hw_counters + 1 ..
//! cycle  time   instret    mhpmcounter3 ..              firmware counters
//! ```

mod alloc;
mod info;
mod lifecycle;

use core::ops::{Range, RangeInclusive};

use hpmux_core::counter::TIME_IDX;
pub use info::{CounterInfo, CounterType};

use crate::arch::{CounterCapabilities, HartCounters};
use crate::config::PMU_FW_COUNTER_MAX;
use crate::error::PmuError;
use crate::event::EventKind;
use crate::hart::HartPmu;
use crate::platform::Platform;
use crate::registry::EventRegistry;

// ———————————————————————————— Counter Layout —————————————————————————————— //

/// How the counter index space is split between hardware and firmware counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterLayout {
    /// Highest hardware counter index.
    pub num_hw_counters: usize,
    /// Size of the whole counter index space.
    pub total_counters: usize,
}

impl CounterLayout {
    pub fn new(caps: &CounterCapabilities) -> Self {
        let mhpm_count = caps.mhpm_count.min(CounterCapabilities::MAX_MHPM_COUNT);
        let num_hw_counters = mhpm_count + 2;
        CounterLayout {
            num_hw_counters,
            total_counters: num_hw_counters + PMU_FW_COUNTER_MAX,
        }
    }

    /// Hardware counter indices, including the unmappable `time`.
    pub fn hw_counters(&self) -> RangeInclusive<usize> {
        0..=self.num_hw_counters
    }

    pub fn fw_counters(&self) -> Range<usize> {
        self.num_hw_counters + 1..self.total_counters
    }

    pub fn is_hw(&self, idx: usize) -> bool {
        idx <= self.num_hw_counters
    }

    /// Whether `idx` names a counter the supervisor can use.
    pub fn is_valid(&self, idx: usize) -> bool {
        idx < self.total_counters && idx != TIME_IDX
    }
}

// —————————————————————————————————— PMU ——————————————————————————————————— //

pub struct Pmu<P: Platform> {
    platform: P,
    registry: EventRegistry,
    layout: CounterLayout,
}

impl<P: Platform> Pmu<P> {
    /// Cold boot initialization, done once by the boot hart.
    ///
    /// Fails with [PmuError::Unsupported] if the hart has no `mcountinhibit`, counters can not be
    /// stopped without it.
    pub fn init(platform: P, caps: CounterCapabilities) -> Result<Self, PmuError> {
        if !caps.has_mcountinhibit {
            log::warn!("No mcountinhibit, PMU extension disabled");
            return Err(PmuError::Unsupported);
        }

        let mut registry = EventRegistry::new();
        platform.pmu_init(&mut registry)?;

        let layout = CounterLayout::new(&caps);
        log::info!(
            "PMU: {} hardware counters, {} firmware counters, {} event mappings",
            layout.num_hw_counters,
            layout.fw_counters().len(),
            registry.len()
        );

        Ok(Pmu {
            platform,
            registry,
            layout,
        })
    }

    /// Per hart initialization, done by every hart on every boot.
    ///
    /// All counters of the hart start out free and stopped.
    pub fn init_hart<H: HartCounters>(&self, hart_id: usize, hw: H) -> Result<HartPmu<H>, PmuError> {
        if !hw.capabilities().has_mcountinhibit {
            log::warn!("Hart {} has no mcountinhibit", hart_id);
            return Err(PmuError::Unsupported);
        }

        let mut hart = HartPmu::new(hart_id, hw, self.layout);
        hart.reset();
        Ok(hart)
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn layout(&self) -> CounterLayout {
        self.layout
    }

    pub fn num_counters(&self) -> usize {
        self.layout.total_counters
    }

    /// Checks that `idx` is a counter bound to a valid event.
    ///
    /// Returns the kind and code of the bound event.
    pub fn validate_counter<H: HartCounters>(
        &self,
        hart: &HartPmu<H>,
        idx: usize,
    ) -> Result<(EventKind, usize), PmuError> {
        if !self.layout.is_valid(idx) {
            return Err(PmuError::InvalidArgument);
        }
        let event = hart.binding(idx).ok_or(PmuError::InvalidArgument)?;
        Ok((event.kind()?, event.code()))
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::arch::host::HostCounters;
    use crate::event::EventIdx;
    use crate::registry::EventRegistry;

    /// A platform with a few hardware events on the programmable counters.
    pub struct TestPlatform {
        pub fail_init: bool,
    }

    impl Platform for TestPlatform {
        fn pmu_init(&self, registry: &mut EventRegistry) -> Result<(), PmuError> {
            if self.fail_init {
                return Err(PmuError::Failed);
            }
            registry.register_hw_event_range(EventIdx::CPU_CYCLES, EventIdx::CPU_CYCLES, 0b001)?;
            registry.register_hw_event_range(
                EventIdx::INSTRUCTIONS,
                EventIdx::INSTRUCTIONS,
                0b100,
            )?;
            // Cache references and misses, any programmable counter
            registry.register_hw_event_range(EventIdx::new(3), EventIdx::new(4), 0xFFFF_FFF8)?;
            // Branches, only on mhpmcounter5 and mhpmcounter6
            registry.register_hw_event_range(EventIdx::new(5), EventIdx::new(6), 0b110_0000)?;
            registry.register_raw_event(0x42, 0xFFFF_FFF8)?;
            Ok(())
        }

        fn mhpmevent_value(&self, event: EventIdx, data: u64) -> u64 {
            match event.raw_value() {
                _ if event.is_raw() => data,
                // No selector known for branch misses
                6 => 0,
                code => 0x100 + code as u64,
            }
        }
    }

    pub fn caps() -> CounterCapabilities {
        CounterCapabilities {
            has_mcountinhibit: true,
            mhpm_count: 4,
            mhpm_bits: 48,
        }
    }

    pub fn setup() -> (Pmu<TestPlatform>, HartPmu<HostCounters>) {
        let pmu = Pmu::init(TestPlatform { fail_init: false }, caps()).unwrap();
        let hart = pmu.init_hart(0, HostCounters::new(caps())).unwrap();
        (pmu, hart)
    }

    #[test]
    fn layout() {
        let layout = CounterLayout::new(&caps());
        assert_eq!(layout.num_hw_counters, 6);
        assert_eq!(layout.total_counters, 6 + PMU_FW_COUNTER_MAX);
        assert_eq!(layout.fw_counters().start, 7);
        assert!(layout.is_hw(6));
        assert!(!layout.is_hw(7));
        assert!(!layout.is_valid(TIME_IDX));
        assert!(!layout.is_valid(layout.total_counters));

        let big = CounterLayout::new(&CounterCapabilities {
            mhpm_count: 64,
            ..caps()
        });
        assert_eq!(big.num_hw_counters, 31);
    }

    #[test]
    fn init_requires_mcountinhibit() {
        let caps = CounterCapabilities {
            has_mcountinhibit: false,
            ..caps()
        };
        assert!(matches!(
            Pmu::init(TestPlatform { fail_init: false }, caps),
            Err(PmuError::Unsupported)
        ));

        let pmu = Pmu::init(TestPlatform { fail_init: false }, self::caps()).unwrap();
        assert!(matches!(
            pmu.init_hart(1, HostCounters::new(caps)),
            Err(PmuError::Unsupported)
        ));
    }

    #[test]
    fn init_propagates_platform_errors() {
        assert!(matches!(
            Pmu::init(TestPlatform { fail_init: true }, caps()),
            Err(PmuError::Failed)
        ));
    }

    #[test]
    fn init_hart_stops_counters() {
        let (pmu, _) = setup();
        let mut hw = HostCounters::new(caps());
        let mut state = hw.read_state();
        state.start(3);
        hw.write_state(state);

        let hart = pmu.init_hart(2, hw).unwrap();
        assert_eq!(hart.hart_id(), 2);
        assert!(hart.hw().read_state().is_free(3));
        assert_eq!(pmu.registry().len(), 5);
    }

    #[test]
    fn validate_unbound_counter() {
        let (pmu, hart) = setup();
        assert_eq!(pmu.validate_counter(&hart, 3), Err(PmuError::InvalidArgument));
        assert_eq!(pmu.validate_counter(&hart, TIME_IDX), Err(PmuError::InvalidArgument));
        assert_eq!(
            pmu.validate_counter(&hart, pmu.num_counters()),
            Err(PmuError::InvalidArgument)
        );
    }
}
