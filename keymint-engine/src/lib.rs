//! Key lifecycle engine for keymint.
//!
//! This crate holds the license key state machine:
//! - [`KeyGenerator`] — random or secret-derived token generation
//! - [`resolve_hwid`] — client identity resolution with a UA+address fallback
//! - [`LifecycleEngine`] — issue, reuse, reject, or rebind decisions
//! - [`AdminController`] — privileged extend/revoke/reset/list operations
//!
//! # Design Principles
//!
//! - **One critical section per request**: every lookup-mutate-persist
//!   sequence runs under a single store lock, so racing requests for the
//!   same identity or token cannot lose updates
//! - **Lazy expiry**: no background eviction; expiry is evaluated against
//!   a `now` captured once per operation
//! - **Lazy binding**: administratively issued keys lock to the first
//!   identity that validates them

mod admin;
mod engine;
mod error;
mod generate;
mod identity;

pub use admin::AdminController;
pub use engine::{IssueOutcome, KeyEvent, LifecycleEngine, DEFAULT_LIFETIME_MS};
pub use error::{EngineError, EngineResult};
pub use generate::{GenerationMode, KeyGenerator, BLOCK_COUNT, BLOCK_LEN};
pub use identity::{fallback_identity, resolve_hwid};
