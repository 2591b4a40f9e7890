//! In-memory store for tests and embedding without file I/O.

use crate::error::StoreResult;
use crate::{find_by_identity_in, KeyStore};
use keymint_types::{KeyId, LicenseRecord};

/// A [`KeyStore`] that keeps records in memory.
///
/// `persist()` only counts invocations so tests can assert that the engine
/// persisted (or skipped persisting) at the right points.
#[derive(Default)]
pub struct MemoryStore {
    records: Vec<LicenseRecord>,
    persist_count: u64,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with records.
    #[must_use]
    pub fn with_records(records: Vec<LicenseRecord>) -> Self {
        Self {
            records,
            persist_count: 0,
        }
    }

    /// Number of times `persist()` has been called.
    #[must_use]
    pub fn persist_count(&self) -> u64 {
        self.persist_count
    }
}

impl KeyStore for MemoryStore {
    fn records(&self) -> Vec<LicenseRecord> {
        self.records.clone()
    }

    fn find_by_id(&self, id: KeyId) -> Option<LicenseRecord> {
        self.records.iter().find(|r| r.id == id).cloned()
    }

    fn find_by_token(&self, token: &str) -> Option<LicenseRecord> {
        self.records.iter().find(|r| r.key == token).cloned()
    }

    fn find_by_identity(&self, hwid: &str) -> Option<LicenseRecord> {
        find_by_identity_in(&self.records, hwid)
    }

    fn upsert(&mut self, record: LicenseRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    fn remove(&mut self, id: KeyId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    fn persist(&mut self) -> StoreResult<()> {
        self.persist_count += 1;
        Ok(())
    }
}
