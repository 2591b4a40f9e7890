//! Privileged administrative operations.
//!
//! The credential check lives at the HTTP boundary; this controller
//! assumes an authorized caller. Every mutating operation persists inside
//! the critical section before returning.

use crate::engine::unique_token;
use crate::error::{EngineError, EngineResult};
use crate::generate::KeyGenerator;
use keymint_store::KeyStore;
use keymint_types::{now_millis, KeyId, LicenseRecord};
use std::sync::{Arc, Mutex};
use tracing::info;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Administrative mutations over the shared store.
pub struct AdminController<S: KeyStore> {
    store: Arc<Mutex<S>>,
    generator: KeyGenerator,
}

impl<S: KeyStore> AdminController<S> {
    /// Creates a controller over the same store the engine uses.
    #[must_use]
    pub fn new(store: Arc<Mutex<S>>, generator: KeyGenerator) -> Self {
        Self { store, generator }
    }

    /// Returns a copy of every record.
    pub fn list_all(&self) -> Vec<LicenseRecord> {
        self.store.lock().unwrap().records()
    }

    /// Adds `hours * 3_600_000` ms to a record's expiry.
    ///
    /// Negative deltas are accepted — callers validate the sign. Extending
    /// a permanent record is rejected: it has no expiry to move.
    pub fn extend(&self, id: KeyId, hours: i64) -> EngineResult<LicenseRecord> {
        let mut store = self.store.lock().unwrap();
        let mut record = store.find_by_id(id).ok_or(EngineError::NotFound)?;
        let expires_at = record.expires_at.ok_or_else(|| {
            EngineError::Validation("cannot extend a permanent key".to_string())
        })?;

        record.expires_at = Some(expires_at + hours * HOUR_MS);
        store.upsert(record.clone());
        store.persist()?;
        info!(id = %id, hours, "extended key expiry");
        Ok(record)
    }

    /// Clears a record's identity binding so a new client can claim it.
    pub fn reset_binding(&self, id: KeyId) -> EngineResult<LicenseRecord> {
        let mut store = self.store.lock().unwrap();
        let mut record = store.find_by_id(id).ok_or(EngineError::NotFound)?;

        record.clear_binding();
        store.upsert(record.clone());
        store.persist()?;
        info!(id = %id, "reset key binding");
        Ok(record)
    }

    /// Removes a record permanently. Irreversible.
    pub fn revoke(&self, id: KeyId) -> EngineResult<()> {
        let mut store = self.store.lock().unwrap();
        if !store.remove(id) {
            return Err(EngineError::NotFound);
        }
        store.persist()?;
        info!(id = %id, "revoked key");
        Ok(())
    }

    /// Issues a non-expiring record not tied to any identity.
    ///
    /// The token is always random — a permanent key has no identity to
    /// derive from. Binding happens lazily on first validation.
    pub fn generate_permanent(&self) -> EngineResult<LicenseRecord> {
        self.generate_permanent_at(now_millis())
    }

    /// Issues a permanent record with an explicit creation timestamp.
    pub fn generate_permanent_at(&self, now: i64) -> EngineResult<LicenseRecord> {
        let mut store = self.store.lock().unwrap();
        let token = unique_token(&mut *store, &self.generator, None, now)?;
        let record = LicenseRecord::new(token, None, now, None);
        store.upsert(record.clone());
        store.persist()?;
        info!(id = %record.id, "issued permanent key");
        Ok(record)
    }
}
