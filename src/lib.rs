//! Hpmux
//!
//! Performance counter virtualization for RISC-V M-mode firmware, implementing the SBI PMU
//! extension. The firmware creates a single [Pmu] during cold boot, then a [HartPmu] per hart, and
//! forwards the PMU ecalls of the supervisor to [Pmu::handle_ecall].
//!
//! ```text
//! Pmu::init ──► Pmu::init_hart ──► handle_ecall ...
//!   (once)        (every hart)       (find_and_bind_counter, counter_start, counter_stop, ...)
//! ```

// Mark the crate as no_std, but only when not running tests.
// We need std to be able to run tests in user-space on the host architecture.
#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
pub mod device_tree;
pub mod ecall;
pub mod error;
pub mod event;
pub mod hart;
pub mod logger;
pub mod platform;
pub mod pmu;
pub mod registry;

pub use ecall::SbiRet;
pub use error::PmuError;
pub use event::{EventIdx, EventKind, FwEvent};
pub use hart::HartPmu;
pub use pmu::{CounterInfo, CounterLayout, Pmu};
