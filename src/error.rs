//! PMU errors
//!
//! Errors never carry text across the SBI boundary, the supervisor only sees the numeric code
//! returned by [PmuError::to_sbi_code].

use hpmux_core::sbi_codes::*;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmuError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("permission denied")]
    PermissionDenied,
    #[error("event registry is full")]
    ResourceExhausted,
    #[error("conflicting event mapping")]
    Conflict,
    #[error("not supported")]
    Unsupported,
    #[error("failed")]
    Failed,
    #[error("counter already started")]
    AlreadyStarted,
    #[error("counter already stopped")]
    AlreadyStopped,
}

impl PmuError {
    pub fn to_sbi_code(self) -> isize {
        match self {
            PmuError::InvalidArgument => SBI_ERR_INVALID_PARAM,
            PmuError::PermissionDenied => SBI_ERR_DENIED,
            PmuError::ResourceExhausted => SBI_ERR_FAILED,
            PmuError::Conflict => SBI_ERR_INVALID_ADDRESS,
            PmuError::Unsupported => SBI_ERR_NOT_SUPPORTED,
            PmuError::Failed => SBI_ERR_FAILED,
            PmuError::AlreadyStarted => SBI_ERR_ALREADY_STARTED,
            PmuError::AlreadyStopped => SBI_ERR_ALREADY_STOPPED,
        }
    }
}
