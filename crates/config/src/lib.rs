//! Hpmux Configuration
//!
//! This crate hosts the environment variables used to configure the performance counter firmware,
//! the chosen configuration values, as well as helpers to parse the variables values at compile
//! time.

#![cfg_attr(not(test), no_std)]

pub mod helper;
use helper::*;

// ———————————————————————————————— Logging ————————————————————————————————— //

/// The desired log level.
pub const LOG_LEVEL: Option<&'static str> = option_env!("HPMUX_LOG_LEVEL");
pub const LOG_LEVEL_ENV: &str = "HPMUX_LOG_LEVEL";

/// If colors in logs are enabled.
pub const LOG_COLOR: bool = is_enabled_default_false!("HPMUX_LOG_COLOR");
pub const LOG_COLOR_ENV: &str = "HPMUX_LOG_COLOR";

/// Modules logged at error level regardless of the global level.
pub const LOG_ERROR: &[&str; str_list_len(option_env!("HPMUX_LOG_ERROR"))] =
    &parse_str_list(option_env!("HPMUX_LOG_ERROR"));
pub const LOG_ERROR_ENV: &str = "HPMUX_LOG_ERROR";

/// Modules logged at warn level regardless of the global level.
pub const LOG_WARN: &[&str; str_list_len(option_env!("HPMUX_LOG_WARN"))] =
    &parse_str_list(option_env!("HPMUX_LOG_WARN"));
pub const LOG_WARN_ENV: &str = "HPMUX_LOG_WARN";

/// Modules logged at info level regardless of the global level.
pub const LOG_INFO: &[&str; str_list_len(option_env!("HPMUX_LOG_INFO"))] =
    &parse_str_list(option_env!("HPMUX_LOG_INFO"));
pub const LOG_INFO_ENV: &str = "HPMUX_LOG_INFO";

/// Modules logged at debug level regardless of the global level.
pub const LOG_DEBUG: &[&str; str_list_len(option_env!("HPMUX_LOG_DEBUG"))] =
    &parse_str_list(option_env!("HPMUX_LOG_DEBUG"));
pub const LOG_DEBUG_ENV: &str = "HPMUX_LOG_DEBUG";

/// Modules logged at trace level regardless of the global level.
pub const LOG_TRACE: &[&str; str_list_len(option_env!("HPMUX_LOG_TRACE"))] =
    &parse_str_list(option_env!("HPMUX_LOG_TRACE"));
pub const LOG_TRACE_ENV: &str = "HPMUX_LOG_TRACE";

// —————————————————————————————————— PMU ——————————————————————————————————— //

/// Maximum number of hardware event descriptors the registry can hold.
pub const PMU_HW_EVENT_MAX: usize = parse_usize_or(option_env!("HPMUX_PMU_HW_EVENT_MAX"), 64);
pub const PMU_HW_EVENT_MAX_ENV: &str = "HPMUX_PMU_HW_EVENT_MAX";

/// Number of firmware counter slots exposed above the hardware counters.
pub const PMU_FW_COUNTER_MAX: usize =
    parse_usize_or(option_env!("HPMUX_PMU_FW_COUNTER_MAX"), 16);
pub const PMU_FW_COUNTER_MAX_ENV: &str = "HPMUX_PMU_FW_COUNTER_MAX";
