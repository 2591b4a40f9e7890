//! Core types for the keymint license service.
//!
//! Defines the universal types the store, engine, and server depend on:
//! - [`KeyId`] — time-ordered unique identifier for a license record
//! - [`LicenseRecord`] — the license itself: token, HWID binding, expiry
//! - [`now_millis`] — wall-clock helper; all record timestamps are epoch millis
//!
//! A record with `expires_at == None` is *permanent*: it never fails the
//! expiry check at any `now`.

mod ids;
mod record;

pub use ids::KeyId;
pub use record::LicenseRecord;

/// Returns the current wall-clock time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
