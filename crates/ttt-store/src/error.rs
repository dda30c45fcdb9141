//! Store errors

use thiserror::Error;
use ttt_core::DomainError;

/// Errors raised by store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        DomainError::StorageError(err.to_string())
    }
}
