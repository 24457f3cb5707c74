use fdt_rs::error::DevTreeError;
use thiserror_no_std::Error;

#[derive(Error, Debug)]
pub enum FdtError {
    #[error("FDT pointer not aligned")]
    FdtPointerNotAligned(),
    #[error("FDT error: {0}")]
    FdtErrorParsing(#[from] DevTreeError),
    #[error("No node compatible with riscv,pmu")]
    NoPmuNode(),
    #[error("Property {0} is not a list of 3-cells records")]
    MalformedProperty(&'static str),
}
