//! Error taxonomy for the lifecycle engine.

use keymint_store::StoreError;
use thiserror::Error;

/// Engine-level failures, returned as typed outcomes to the boundary
/// layer which maps them to responses. None of these should crash the
/// process.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required input was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// No record matches the given id or token.
    #[error("key not found")]
    NotFound,

    /// The record exists but its expiry has passed.
    #[error("key has expired")]
    Expired,

    /// The record is bound to a different identity than the caller's.
    #[error("key is bound to a different HWID")]
    IdentityMismatch,

    /// Token generation could not produce a usable token.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The store could not durably persist a mutation.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
