//! Error types for the store.

use thiserror::Error;

/// Store-specific errors.
///
/// Load-time corruption is deliberately absent: a corrupt snapshot yields
/// an empty store (logged, not fatal). Write failures are errors — they
/// must surface to the caller, never be swallowed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing file could not be written.
    #[error("failed to write store file: {0}")]
    Io(#[from] std::io::Error),

    /// Record set could not be serialized.
    #[error("failed to serialize records: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
