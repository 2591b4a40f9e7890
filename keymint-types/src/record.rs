//! The license record: a token bound (or bindable) to one client identity.
//!
//! Serialized field names (`id`, `key`, `hwid`, `createdAt`, `expiresAt`)
//! are the on-disk and on-wire layout; `expiresAt: null` is the permanent
//! sentinel.

use crate::ids::KeyId;
use serde::{Deserialize, Serialize};

/// A single issued license.
///
/// `id` and `key` are immutable once issued. `hwid` starts unset for
/// administratively issued keys and is bound at most once by validation
/// (or cleared again by an admin reset). The store is the sole owner of
/// records; callers always receive clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Unique record identifier, assigned at creation.
    pub id: KeyId,
    /// The license token string, unique across the store.
    pub key: String,
    /// Client identity the key is locked to, if bound.
    pub hwid: Option<String>,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Expiry time, epoch milliseconds. `None` means the key never expires.
    pub expires_at: Option<i64>,
}

impl LicenseRecord {
    /// Creates a record expiring at `expires_at`, eagerly bound to `hwid`.
    #[must_use]
    pub fn new(key: String, hwid: Option<String>, created_at: i64, expires_at: Option<i64>) -> Self {
        Self {
            id: KeyId::new(),
            key,
            hwid,
            created_at,
            expires_at,
        }
    }

    /// Returns true if this record never expires.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    /// Returns true if the record is expired at `now`.
    ///
    /// Permanent records are never expired. Expiry is inclusive: a record
    /// whose `expires_at` equals `now` is already expired.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Returns true if the record is still usable at `now`.
    #[must_use]
    pub fn is_live(&self, now: i64) -> bool {
        !self.is_expired(now)
    }

    /// Returns true if the record is bound to the given identity.
    ///
    /// An unbound record matches no identity.
    #[must_use]
    pub fn is_bound_to(&self, hwid: &str) -> bool {
        self.hwid.as_deref() == Some(hwid)
    }

    /// Binds the record to an identity. Overwrites any previous binding;
    /// callers enforce the bind-once policy.
    pub fn bind(&mut self, hwid: &str) {
        self.hwid = Some(hwid.to_string());
    }

    /// Clears the identity binding.
    pub fn clear_binding(&mut self) {
        self.hwid = None;
    }
}
