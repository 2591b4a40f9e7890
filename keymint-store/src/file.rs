//! JSON flat-file store.
//!
//! The backing file holds the full record set as a pretty-printed JSON
//! array. Writes go through a sibling temp file and an atomic rename so a
//! crash mid-write leaves the previous snapshot intact.

use crate::error::StoreResult;
use crate::{find_by_identity_in, KeyStore};
use keymint_types::{KeyId, LicenseRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// License record store backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<LicenseRecord>,
}

impl JsonFileStore {
    /// Opens a store at `path`, loading any existing snapshot.
    ///
    /// A missing file starts an empty store. A corrupt file also starts an
    /// empty store: load-time corruption is swallowed by policy, with a
    /// warning as the only signal. Known gap — there is no corruption
    /// alarm, and the bad snapshot is overwritten on the next persist.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<LicenseRecord>>(&contents) {
                Ok(records) => {
                    info!("loaded {} keys from {}", records.len(), path.display());
                    records
                }
                Err(e) => {
                    warn!("corrupt store file {}, starting empty: {e}", path.display());
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self { path, records }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for JsonFileStore {
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
        let json = serde_json::to_string_pretty(&self.records)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
