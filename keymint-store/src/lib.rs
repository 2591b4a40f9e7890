//! Flat-file persistence for license records.
//!
//! The store is a durable mapping of record id → [`LicenseRecord`] with
//! exact-match lookups by id, token, and bound identity. Persistence is
//! synchronous and whole-snapshot: every mutation serializes the entire
//! record set and rewrites the backing file. There is no append log and
//! no background compaction.
//!
//! Two implementations:
//! - [`JsonFileStore`] — production store backed by a single JSON file
//! - [`MemoryStore`] — in-memory test double with the same contract
//!
//! The store is the sole owner of records; lookups return clones. The
//! store itself is not thread-safe — callers serialize access (the engine
//! wraps it in a mutex).

mod error;
mod file;
mod memory;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use keymint_types::{KeyId, LicenseRecord};

/// Contract for a license record store.
pub trait KeyStore: Send {
    /// Returns a snapshot of every record.
    fn records(&self) -> Vec<LicenseRecord>;

    /// Looks up a record by id.
    fn find_by_id(&self, id: KeyId) -> Option<LicenseRecord>;

    /// Looks up a record by its token string.
    fn find_by_token(&self, token: &str) -> Option<LicenseRecord>;

    /// Looks up a record bound to the given identity.
    ///
    /// If duplicates exist the most recently created record wins, so the
    /// result is deterministic even when the uniqueness invariant has been
    /// violated by an older snapshot.
    fn find_by_identity(&self, hwid: &str) -> Option<LicenseRecord>;

    /// Inserts the record, replacing any existing record with the same id.
    fn upsert(&mut self, record: LicenseRecord);

    /// Removes a record by id. Returns true if a record was removed.
    fn remove(&mut self, id: KeyId) -> bool;

    /// Writes the full record set to durable storage.
    ///
    /// Must complete before a mutating operation's response is trusted.
    fn persist(&mut self) -> StoreResult<()>;
}

impl<T: KeyStore + ?Sized> KeyStore for Box<T> {
    fn records(&self) -> Vec<LicenseRecord> {
        (**self).records()
    }

    fn find_by_id(&self, id: KeyId) -> Option<LicenseRecord> {
        (**self).find_by_id(id)
    }

    fn find_by_token(&self, token: &str) -> Option<LicenseRecord> {
        (**self).find_by_token(token)
    }

    fn find_by_identity(&self, hwid: &str) -> Option<LicenseRecord> {
        (**self).find_by_identity(hwid)
    }

    fn upsert(&mut self, record: LicenseRecord) {
        (**self).upsert(record);
    }

    fn remove(&mut self, id: KeyId) -> bool {
        (**self).remove(id)
    }

    fn persist(&mut self) -> StoreResult<()> {
        (**self).persist()
    }
}

/// Shared lookup logic over a record slice.
pub(crate) fn find_by_identity_in(records: &[LicenseRecord], hwid: &str) -> Option<LicenseRecord> {
    records
        .iter()
        .filter(|r| r.is_bound_to(hwid))
        .max_by_key(|r| r.created_at)
        .cloned()
}
