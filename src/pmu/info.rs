//! Counter info words, as returned to the supervisor.

use hpmux_core::counter::{CYCLE_IDX, INFO_TYPE_FW, INFO_TYPE_HW, INSTRET_IDX};
use hpmux_core::csr;

use super::{Pmu, PmuError};
use crate::arch::HartCounters;
use crate::hart::HartPmu;
use crate::platform::Platform;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterType {
    Hardware,
    Firmware,
}

/// Description of a counter.
///
/// ```text
///  XLEN-1   XLEN-2     18 17     12 11       0
/// +------+---------------+---------+----------+
/// | type |       0       |  width  |   csr    |
/// +------+---------------+---------+----------+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterInfo {
    /// CSR of the user-visible counter, 0 for firmware counters.
    pub csr: usize,
    /// Number of bits of the counter, minus one.
    pub width: usize,
    pub kind: CounterType,
}

impl CounterInfo {
    const CSR_MASK: usize = 0xFFF;
    const WIDTH_OFFSET: usize = 12;
    const WIDTH_MASK: usize = 0x3F;
    const TYPE_OFFSET: usize = usize::BITS as usize - 1;

    pub fn to_bits(self) -> usize {
        let ty = match self.kind {
            CounterType::Hardware => INFO_TYPE_HW,
            CounterType::Firmware => INFO_TYPE_FW,
        };
        (self.csr & Self::CSR_MASK)
            | ((self.width & Self::WIDTH_MASK) << Self::WIDTH_OFFSET)
            | (ty << Self::TYPE_OFFSET)
    }

    pub fn from_bits(bits: usize) -> Self {
        let kind = if (bits >> Self::TYPE_OFFSET) == INFO_TYPE_FW {
            CounterType::Firmware
        } else {
            CounterType::Hardware
        };
        CounterInfo {
            csr: bits & Self::CSR_MASK,
            width: (bits >> Self::WIDTH_OFFSET) & Self::WIDTH_MASK,
            kind,
        }
    }
}

impl<P: Platform> Pmu<P> {
    /// Describes counter `idx`, bound or not.
    pub fn counter_info<H: HartCounters>(
        &self,
        hart: &HartPmu<H>,
        idx: usize,
    ) -> Result<CounterInfo, PmuError> {
        if !self.layout.is_valid(idx) {
            return Err(PmuError::InvalidArgument);
        }

        if !self.layout.is_hw(idx) {
            return Ok(CounterInfo {
                csr: 0,
                width: usize::BITS as usize - 1,
                kind: CounterType::Firmware,
            });
        }

        let width = if idx == CYCLE_IDX || idx == INSTRET_IDX {
            63
        } else {
            hart.hw().capabilities().mhpm_bits.saturating_sub(1)
        };
        Ok(CounterInfo {
            csr: csr::CYCLE + idx,
            width,
            kind: CounterType::Hardware,
        })
    }
}
