//! Device tree driven platform, such as QEMU's virt board.

use flattened_device_tree::error::FdtError;
use flattened_device_tree::FlattenedDeviceTree;

use super::{register_fixed_events, Platform};
use crate::device_tree;
use crate::error::PmuError;
use crate::event::EventIdx;
use crate::registry::{EventRegistry, EventSelectTable};

/// A platform whose events are described by the `riscv,pmu` device tree node.
pub struct VirtPlatform<'dt> {
    fdt: Option<FlattenedDeviceTree<'dt>>,
    selects: EventSelectTable,
}

impl<'dt> VirtPlatform<'dt> {
    pub fn new(fdt: FlattenedDeviceTree<'dt>) -> Result<Self, FdtError> {
        let mut selects = EventSelectTable::new();
        match device_tree::load_event_selects(&fdt, &mut selects) {
            Ok(()) | Err(FdtError::NoPmuNode()) => {}
            Err(err) => return Err(err),
        }

        Ok(VirtPlatform {
            fdt: Some(fdt),
            selects,
        })
    }

    /// A platform with only the fixed counters.
    pub fn without_device_tree() -> Self {
        VirtPlatform {
            fdt: None,
            selects: EventSelectTable::new(),
        }
    }
}

impl Platform for VirtPlatform<'_> {
    fn pmu_init(&self, registry: &mut EventRegistry) -> Result<(), PmuError> {
        let Some(fdt) = &self.fdt else {
            return register_fixed_events(registry);
        };

        match device_tree::load_events(fdt, registry) {
            Ok(()) => Ok(()),
            Err(FdtError::NoPmuNode()) => {
                log::info!("No PMU node in the device tree, only fixed counters are available");
                register_fixed_events(registry)
            }
            Err(err) => {
                log::error!("Invalid PMU node: {}", err);
                Err(PmuError::Failed)
            }
        }
    }

    fn mhpmevent_value(&self, event: EventIdx, data: u64) -> u64 {
        if event.is_raw() {
            data
        } else {
            self.selects.lookup_select(event)
        }
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::host::HostCounters;
    use crate::device_tree::tests::{pmu_dtb, DtbBuilder};
    use crate::device_tree::{EVENT_TO_COUNTERS, PMU_COMPATIBLE};
    use crate::pmu::tests::caps;
    use crate::pmu::Pmu;

    #[test]
    fn boot_from_device_tree() {
        let dtb = pmu_dtb();
        let fdt = FlattenedDeviceTree::from_slice(dtb.bytes()).unwrap();
        let platform = VirtPlatform::new(fdt).unwrap();
        assert_eq!(platform.mhpmevent_value(EventIdx::new(3), 0), 0x13);
        assert_eq!(platform.mhpmevent_value(EventIdx::new(6), 0), 0);
        assert_eq!(platform.mhpmevent_value(EventIdx::RAW, 0x42), 0x42);

        let pmu = Pmu::init(platform, caps()).unwrap();
        assert_eq!(pmu.registry().len(), 5);

        let mut hart = pmu.init_hart(0, HostCounters::new(caps())).unwrap();
        let idx = pmu
            .find_and_bind_counter(&mut hart, 0, usize::MAX, EventIdx::new(3), 0)
            .unwrap();
        assert_eq!(idx, 3);
        assert_eq!(hart.hw().event_selector(3), 0x13);

        // No selector for event 6
        assert_eq!(
            pmu.find_and_bind_counter(&mut hart, 0, usize::MAX, EventIdx::new(6), 0),
            Err(PmuError::Failed)
        );
    }

    #[test]
    fn boot_without_pmu_node() {
        let dtb = DtbBuilder::new().build();
        let fdt = FlattenedDeviceTree::from_slice(dtb.bytes()).unwrap();
        let pmu = Pmu::init(VirtPlatform::new(fdt).unwrap(), caps()).unwrap();
        assert_eq!(pmu.registry().len(), 2);

        let pmu = Pmu::init(VirtPlatform::without_device_tree(), caps()).unwrap();
        let mut hart = pmu.init_hart(0, HostCounters::new(caps())).unwrap();
        assert_eq!(
            pmu.find_and_bind_counter(&mut hart, 0, usize::MAX, EventIdx::INSTRUCTIONS, 0),
            Ok(2)
        );
        assert_eq!(
            pmu.find_and_bind_counter(&mut hart, 0, usize::MAX, EventIdx::new(3), 0),
            Err(PmuError::Unsupported)
        );
    }

    #[test]
    fn boot_with_malformed_node() {
        let dtb = DtbBuilder::new()
            .begin_node("pmu")
            .prop_str("compatible", PMU_COMPATIBLE)
            .prop_cells(EVENT_TO_COUNTERS, &[1, 1, 1, 2])
            .end_node()
            .build();
        let fdt = FlattenedDeviceTree::from_slice(dtb.bytes()).unwrap();
        let platform = VirtPlatform::new(fdt).unwrap();
        assert!(matches!(Pmu::init(platform, caps()), Err(PmuError::Failed)));
    }
}
