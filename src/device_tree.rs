//! PMU boot configuration from the device tree
//!
//! The PMU node (compatible with `riscv,pmu`) carries three tables of 3-cell records:
//!
//! - `opensbi,event-to-counters`: `<start end counters>`, hardware event ranges.
//! - `opensbi,event-to-mhpmevent`: `<event select_hi select_lo>`, selector values.
//! - `opensbi,raw-event-to-counters`: `<select_hi select_lo counters>`, raw events.
//!
//! A missing table is not an error. Records that can not be registered are logged and skipped,
//! a table that is not a list of 3-cell records fails the whole load.

use fdt_rs::base::DevTreeNode;
use fdt_rs::prelude::PropReader;
use flattened_device_tree::error::FdtError;
use flattened_device_tree::{cell_count, find_prop, prop_header_offset, read_cell, FlattenedDeviceTree};

use crate::event::EventIdx;
use crate::registry::{EventRegistry, EventSelectTable};

pub const PMU_COMPATIBLE: &str = "riscv,pmu";
pub const EVENT_TO_COUNTERS: &str = "opensbi,event-to-counters";
pub const EVENT_TO_MHPMEVENT: &str = "opensbi,event-to-mhpmevent";
pub const RAW_EVENT_TO_COUNTERS: &str = "opensbi,raw-event-to-counters";

const PMU_PROPERTIES: [&str; 3] = [EVENT_TO_COUNTERS, EVENT_TO_MHPMEVENT, RAW_EVENT_TO_COUNTERS];

/// Size of a record, in cells.
const RECORD_CELLS: usize = 3;
const CELL_SIZE: usize = core::mem::size_of::<u32>();

const FDT_NOP: u32 = 0x0000_0004;

// —————————————————————————————— Loading ——————————————————————————————————— //

/// Fills `selects` with the selector values of the PMU node.
pub fn load_event_selects(fdt: &FlattenedDeviceTree, selects: &mut EventSelectTable) -> Result<(), FdtError> {
    let node = pmu_node(fdt)?;
    for_each_record(&node, EVENT_TO_MHPMEVENT, |[event, select_hi, select_lo]| {
        let event = EventIdx::new(event as usize);
        if let Err(err) = selects.insert(event, join_cells(select_hi, select_lo)) {
            log::warn!("Skipping selector of event 0x{:x}: {}", event.raw_value(), err);
        }
    })
}

/// Registers the hardware and raw events of the PMU node.
pub fn load_events(fdt: &FlattenedDeviceTree, registry: &mut EventRegistry) -> Result<(), FdtError> {
    let node = pmu_node(fdt)?;

    for_each_record(&node, EVENT_TO_COUNTERS, |[start, end, counters]| {
        let start = EventIdx::new(start as usize);
        let end = EventIdx::new(end as usize);
        if let Err(err) = registry.register_hw_event_range(start, end, counters) {
            log::warn!(
                "Skipping events 0x{:x}-0x{:x}: {}",
                start.raw_value(),
                end.raw_value(),
                err
            );
        }
    })?;

    for_each_record(&node, RAW_EVENT_TO_COUNTERS, |[select_hi, select_lo, counters]| {
        let select = join_cells(select_hi, select_lo);
        if let Err(err) = registry.register_raw_event(select, counters) {
            log::warn!("Skipping raw event 0x{:x}: {}", select, err);
        }
    })
}

fn pmu_node<'a, 'dt>(fdt: &'a FlattenedDeviceTree<'dt>) -> Result<DevTreeNode<'a, 'dt>, FdtError> {
    fdt.compatible_node(PMU_COMPATIBLE)?
        .ok_or_else(FdtError::NoPmuNode)
}

/// Calls `f` on each record of property `name`, if the property exists.
fn for_each_record(
    node: &DevTreeNode,
    name: &'static str,
    mut f: impl FnMut([u32; RECORD_CELLS]),
) -> Result<(), FdtError> {
    let Some(prop) = find_prop(node, name)? else {
        log::debug!("No {} property", name);
        return Ok(());
    };

    if prop.length() % (RECORD_CELLS * CELL_SIZE) != 0 {
        log::warn!("Property {} has length {}", name, prop.length());
        return Err(FdtError::MalformedProperty(name));
    }

    for record in 0..cell_count(&prop) / RECORD_CELLS {
        let first = record * RECORD_CELLS;
        f([
            read_cell(&prop, first)?,
            read_cell(&prop, first + 1)?,
            read_cell(&prop, first + 2)?,
        ]);
    }
    Ok(())
}

fn join_cells(hi: u32, lo: u32) -> u64 {
    ((hi as u64) << 32) | lo as u64
}

// ———————————————————————————— Configuration Removal ——————————————————————— //

/// Removes the PMU tables from the device tree handed to the supervisor.
///
/// The properties are overwritten with `FDT_NOP` tokens in place, the blob keeps its size.
/// Returns the number of removed properties.
pub fn remove_pmu_config(blob: &mut [u8]) -> Result<usize, FdtError> {
    let mut patches = [(0usize, 0usize); PMU_PROPERTIES.len()];
    let mut count = 0;

    {
        let fdt = FlattenedDeviceTree::from_slice(blob)?;
        let Some(node) = fdt.compatible_node(PMU_COMPATIBLE)? else {
            return Ok(0);
        };
        for name in PMU_PROPERTIES {
            if let Some(prop) = find_prop(&node, name)? {
                let offset = prop_header_offset(&fdt, &prop);
                let size = 3 * CELL_SIZE + prop.length().next_multiple_of(CELL_SIZE);
                patches[count] = (offset, size);
                count += 1;
            }
        }
    }

    for (offset, size) in &patches[..count] {
        for token in blob[*offset..*offset + *size].chunks_exact_mut(CELL_SIZE) {
            token.copy_from_slice(&FDT_NOP.to_be_bytes());
        }
    }

    log::debug!("Removed {} PMU properties from the device tree", count);
    Ok(count)
}

// ————————————————————————————————— Tests —————————————————————————————————— //
