//! Error types for the processor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for processor operations
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Chunk options that cannot produce valid chunks
    #[error("invalid chunk options: {0}")]
    InvalidOptions(String),

    /// Chunking error
    #[error("chunking error: {0}")]
    Chunking(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<ProcessError> for CrateError {
    fn from(err: ProcessError) -> Self {
        CrateError::Process(err.to_string())
    }
}
