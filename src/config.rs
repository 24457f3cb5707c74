//! Configuration constants
//!
//! The values are parsed from `HPMUX_*` environment variables at compile time by
//! [hpmux_config], this module adds the values derived from them.

use hpmux_core::counter::HW_COUNTER_MAX;
pub use hpmux_config::{
    LOG_COLOR, LOG_DEBUG, LOG_ERROR, LOG_INFO, LOG_LEVEL, LOG_TRACE, LOG_WARN, PMU_FW_COUNTER_MAX,
    PMU_HW_EVENT_MAX,
};

/// Size of the counter index space: all hardware counter slots followed by the firmware ones.
pub const PMU_COUNTER_MAX: usize = HW_COUNTER_MAX + PMU_FW_COUNTER_MAX;

const _: () = assert!(PMU_HW_EVENT_MAX > 0, "The event registry can not be empty");
