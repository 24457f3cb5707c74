//! SBI PMU ecall dispatch
//!
//! Decodes the arguments of a PMU ecall (`a0` to `a4`, function ID in `a6`) and encodes the result
//! in the `(error, value)` pair returned in `a0` and `a1`.

use hpmux_core::pmu::*;
use hpmux_core::sbi_codes::SBI_SUCCESS;

use crate::arch::HartCounters;
use crate::error::PmuError;
use crate::event::EventIdx;
use crate::hart::HartPmu;
use crate::platform::Platform;
use crate::pmu::{CounterInfo, Pmu};

/// The value returned by an SBI call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SbiRet {
    pub error: isize,
    pub value: usize,
}

impl SbiRet {
    pub fn success(value: usize) -> Self {
        SbiRet {
            error: SBI_SUCCESS,
            value,
        }
    }
}

impl From<PmuError> for SbiRet {
    fn from(err: PmuError) -> Self {
        SbiRet {
            error: err.to_sbi_code(),
            value: 0,
        }
    }
}

impl From<Result<usize, PmuError>> for SbiRet {
    fn from(result: Result<usize, PmuError>) -> Self {
        match result {
            Ok(value) => SbiRet::success(value),
            Err(err) => err.into(),
        }
    }
}

impl<P: Platform> Pmu<P> {
    /// Handles a call to the PMU extension, `args` holds `a0` to `a4`.
    pub fn handle_ecall<H: HartCounters>(
        &self,
        hart: &mut HartPmu<H>,
        fid: usize,
        args: [usize; 5],
    ) -> SbiRet {
        let result = match fid {
            NUM_COUNTERS_FID => Ok(self.num_counters()),
            COUNTER_GET_INFO_FID => self.counter_info(hart, args[0]).map(CounterInfo::to_bits),
            COUNTER_CFG_MATCH_FID => self.find_and_bind_counter(
                hart,
                args[0],
                args[1],
                EventIdx::new(args[2]),
                join_halves(args[3], args[4]),
            ),
            COUNTER_START_FID => self
                .counter_start(hart, args[0], join_halves(args[1], args[2]))
                .map(|_| 0),
            COUNTER_STOP_FID => self.counter_stop(hart, args[0], args[1] != 0).map(|_| 0),
            COUNTER_FW_READ_FID => self.counter_read(hart, args[0]).map(|value| value as usize),
            _ => {
                log::debug!("Unknown PMU function 0x{:x}", fid);
                Err(PmuError::Unsupported)
            }
        };

        if let Err(err) = result {
            log::trace!("Hart {}: PMU call 0x{:x} failed: {}", hart.hart_id(), fid, err);
        }
        result.into()
    }
}

/// 64-bit arguments are split across two registers on 32-bit harts.
fn join_halves(low: usize, high: usize) -> u64 {
    if usize::BITS == 32 {
        ((high as u64) << 32) | low as u64
    } else {
        low as u64
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
