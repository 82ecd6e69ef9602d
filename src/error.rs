//! Error types for the radix join core.

use thiserror::Error;

/// The error kinds the core can surface. All of them are fatal: the core is a
/// one-shot batch computation, so any fault here indicates a configuration or
/// capacity problem that requires operator intervention (see `SPEC_FULL.md` §7).
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("out of memory while allocating {0}")]
    OutOfMemory(String),

    #[error("failed to initialize barrier for {0} threads")]
    BarrierInit(usize),

    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Top-level error type returned by fallible operations in this crate.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] ErrorKind);

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error(ErrorKind::ThreadSpawn(e))
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error(ErrorKind::Csv(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
