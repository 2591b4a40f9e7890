//! The lifecycle decision engine.
//!
//! Decision table for a request carrying (optional token, identity):
//!
//! | Condition | Action |
//! |---|---|
//! | no token, no live record for identity | create, bind, persist |
//! | no token, live record for identity | return it unchanged |
//! | no token, only expired records | create a fresh record |
//! | token, unknown | not-found |
//! | token, expired | expired |
//! | token, bound elsewhere | identity-mismatch |
//! | token, unbound | bind lazily, persist |
//! | token, bound here | success, no mutation |
//!
//! `now` is captured once per operation so the clock cannot move between
//! the expiry check and the mutation. The whole sequence holds the store
//! lock, so concurrent requests for the same identity serialize and the
//! double-issue race resolves to one winner.

use crate::error::{EngineError, EngineResult};
use crate::generate::KeyGenerator;
use keymint_store::KeyStore;
use keymint_types::{now_millis, LicenseRecord};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Default key lifetime: 24 hours in milliseconds.
pub const DEFAULT_LIFETIME_MS: i64 = 24 * 60 * 60 * 1000;

/// Retry budget for random-mode token collisions.
const MAX_GENERATION_ATTEMPTS: u32 = 8;

/// What an operation did, for the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A new record was created and bound.
    Issued,
    /// An existing live record was returned unchanged.
    Reused,
    /// A token validated successfully (possibly binding lazily).
    Validated,
    /// An admin issued a permanent record.
    PermanentIssued,
    /// An admin extended a record's expiry.
    Extended,
    /// An admin cleared a record's identity binding.
    BindingReset,
    /// An admin removed a record.
    Revoked,
}

/// Result of an issue request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOutcome {
    /// The issued or reused record.
    pub record: LicenseRecord,
    /// True if a new record was created.
    pub created: bool,
}

impl IssueOutcome {
    /// The event this outcome corresponds to.
    #[must_use]
    pub fn event(&self) -> KeyEvent {
        if self.created {
            KeyEvent::Issued
        } else {
            KeyEvent::Reused
        }
    }
}

/// Decides whether to issue, reuse, reject, or rebind a key.
///
/// Holds the shared store behind a mutex; every operation is one critical
/// section covering lookup, mutation, and persist.
pub struct LifecycleEngine<S: KeyStore> {
    store: Arc<Mutex<S>>,
    generator: KeyGenerator,
    lifetime_ms: i64,
}

impl<S: KeyStore> LifecycleEngine<S> {
    /// Creates an engine over a shared store.
    #[must_use]
    pub fn new(store: Arc<Mutex<S>>, generator: KeyGenerator, lifetime_ms: i64) -> Self {
        Self {
            store,
            generator,
            lifetime_ms,
        }
    }

    /// Issues a key for `hwid` at the current time.
    pub fn issue(&self, hwid: &str) -> EngineResult<IssueOutcome> {
        self.issue_at(hwid, now_millis())
    }

    /// Issues a key for `hwid` with an explicit timestamp.
    ///
    /// If a live record is already bound to this identity it is returned
    /// unchanged (idempotent re-issue, no persist). Expired records are
    /// ignored and a fresh record is created, eagerly bound, expiring at
    /// `now + lifetime`.
    pub fn issue_at(&self, hwid: &str, now: i64) -> EngineResult<IssueOutcome> {
        let mut store = self.store.lock().unwrap();

        if let Some(existing) = store.find_by_identity(hwid) {
            if existing.is_live(now) {
                debug!(key = %existing.key, "reusing live key for identity");
                return Ok(IssueOutcome {
                    record: existing,
                    created: false,
                });
            }
        }

        let token = unique_token(&mut *store, &self.generator, Some(hwid), now)?;
        let record = LicenseRecord::new(
            token,
            Some(hwid.to_string()),
            now,
            Some(now + self.lifetime_ms),
        );
        store.upsert(record.clone());
        store.persist()?;
        info!(id = %record.id, "issued new key");

        Ok(IssueOutcome {
            record,
            created: true,
        })
    }

    /// Validates a token presented by `hwid` at the current time.
    pub fn validate(&self, token: &str, hwid: &str) -> EngineResult<LicenseRecord> {
        self.validate_at(token, hwid, now_millis())
    }

    /// Validates a token with an explicit timestamp.
    ///
    /// An unbound record binds lazily to the caller and is persisted; a
    /// record bound to this caller succeeds without mutation. Binding is
    /// monotonic: a live record bound elsewhere always fails with a
    /// mismatch, never silently rebinds.
    pub fn validate_at(&self, token: &str, hwid: &str, now: i64) -> EngineResult<LicenseRecord> {
        if token.is_empty() {
            return Err(EngineError::Validation("no key provided".to_string()));
        }

        let mut store = self.store.lock().unwrap();

        let mut record = store.find_by_token(token).ok_or(EngineError::NotFound)?;

        if record.is_expired(now) {
            return Err(EngineError::Expired);
        }

        match record.hwid.as_deref() {
            Some(bound) if bound != hwid => Err(EngineError::IdentityMismatch),
            Some(_) => Ok(record),
            None => {
                record.bind(hwid);
                store.upsert(record.clone());
                store.persist()?;
                info!(id = %record.id, "key bound on first validation");
                Ok(record)
            }
        }
    }
}

/// Generates a token not already present in the store.
///
/// Random-mode collisions are astronomically unlikely but the outcome is
/// defined: retry up to the attempt budget, then fail. A collision with an
/// *expired* record replaces it — derived mode regenerates the same token
/// for the same identity by design, and renewal must not wedge on the old
/// record. A derived token colliding with a live record cannot be retried
/// away and is reported as a generation failure.
pub(crate) fn unique_token<S: KeyStore + ?Sized>(
    store: &mut S,
    generator: &KeyGenerator,
    hwid: Option<&str>,
    now: i64,
) -> EngineResult<String> {
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let token = match hwid {
            Some(hwid) => generator.generate(hwid),
            None => generator.generate_random(),
        };
        match store.find_by_token(&token) {
            None => return Ok(token),
            Some(existing) if existing.is_expired(now) => {
                debug!(id = %existing.id, "replacing expired record with colliding token");
                store.remove(existing.id);
                return Ok(token);
            }
            Some(_) if generator.is_deterministic() && hwid.is_some() => {
                return Err(EngineError::KeyGeneration(
                    "derived token already issued and live".to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    Err(EngineError::KeyGeneration(
        "token collision persisted across retries".to_string(),
    ))
}
