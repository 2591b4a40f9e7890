mod common;

use common::{engine, engine_with_admin, persist_count, DAY_MS};
use keymint_engine::{EngineError, KeyGenerator, LifecycleEngine};
use keymint_store::{KeyStore, MemoryStore};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

// ── Issue path ───────────────────────────────────────────────────

#[test]
fn first_issue_creates_bound_record_with_default_lifetime() {
    let (_, engine) = engine();
    let outcome = engine.issue_at("A", 0).unwrap();

    assert!(outcome.created);
    assert!(outcome.record.is_bound_to("A"));
    assert_eq!(outcome.record.created_at, 0);
    assert_eq!(outcome.record.expires_at, Some(DAY_MS));
}

#[test]
fn second_issue_is_idempotent_while_live() {
    let (store, engine) = engine();
    let first = engine.issue_at("A", 0).unwrap();
    let persists_after_first = persist_count(&store);

    let second = engine.issue_at("A", 1_000).unwrap();

    assert!(!second.created);
    assert_eq!(second.record, first.record);
    // Reuse is read-only: no extra persist.
    assert_eq!(persist_count(&store), persists_after_first);
}

#[test]
fn issue_after_expiry_creates_fresh_record() {
    let (_, engine) = engine();
    let first = engine.issue_at("A", 0).unwrap();

    // One millisecond past the 24h boundary.
    let second = engine.issue_at("A", DAY_MS + 1).unwrap();

    assert!(second.created);
    assert_ne!(second.record.id, first.record.id);
    assert_ne!(second.record.key, first.record.key);
    assert_eq!(second.record.expires_at, Some(DAY_MS + 1 + DAY_MS));
}

#[test]
fn issue_at_exact_expiry_instant_treats_record_as_expired() {
    let (_, engine) = engine();
    let first = engine.issue_at("A", 0).unwrap();
    let second = engine.issue_at("A", DAY_MS).unwrap();

    assert!(second.created);
    assert_ne!(second.record.key, first.record.key);
}

#[test]
fn issues_for_distinct_identities_are_independent() {
    let (_, engine) = engine();
    let a = engine.issue_at("A", 0).unwrap();
    let b = engine.issue_at("B", 0).unwrap();

    assert!(a.created && b.created);
    assert_ne!(a.record.key, b.record.key);
}

#[test]
fn issue_prefers_most_recent_record_for_identity() {
    use keymint_types::LicenseRecord;

    // Duplicate bindings should not occur, but the tie-break is defined:
    // most recent createdAt wins.
    let older = LicenseRecord::new("MINT-old".into(), Some("A".into()), 0, Some(DAY_MS));
    let newer = LicenseRecord::new("MINT-new".into(), Some("A".into()), 100, Some(DAY_MS));
    let store = Arc::new(Mutex::new(MemoryStore::with_records(vec![
        older,
        newer.clone(),
    ])));
    let engine = LifecycleEngine::new(store, KeyGenerator::random("MINT"), DAY_MS);

    let outcome = engine.issue_at("A", 50).unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.record, newer);
}

// ── Validate path ────────────────────────────────────────────────

#[test]
fn validate_empty_token_is_a_validation_error() {
    let (_, engine) = engine();
    let err = engine.validate_at("", "A", 0).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn validate_unknown_token_is_not_found() {
    let (_, engine) = engine();
    let err = engine.validate_at("MINT-nope", "A", 0).unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

#[test]
fn validate_expired_token_fails_even_though_still_stored() {
    let (store, engine) = engine();
    let token = engine.issue_at("A", 0).unwrap().record.key;

    let err = engine.validate_at(&token, "A", DAY_MS + 1).unwrap_err();
    assert!(matches!(err, EngineError::Expired));

    // Expiry is lazy: the record is still in storage.
    assert!(store.lock().unwrap().find_by_token(&token).is_some());
}

#[test]
fn validate_bound_token_from_other_identity_is_mismatch() {
    let (_, engine) = engine();
    let token = engine.issue_at("A", 0).unwrap().record.key;

    let err = engine.validate_at(&token, "B", 1).unwrap_err();
    assert!(matches!(err, EngineError::IdentityMismatch));

    // Binding is monotonic: the original holder still validates.
    assert!(engine.validate_at(&token, "A", 2).is_ok());
}

#[test]
fn validate_unbound_token_binds_lazily_and_persists() {
    let (store, engine, admin) = engine_with_admin();
    let permanent = admin.generate_permanent_at(0).unwrap();
    assert!(permanent.hwid.is_none());

    let persists_before = persist_count(&store);
    let validated = engine.validate_at(&permanent.key, "A", 10).unwrap();

    assert!(validated.is_bound_to("A"));
    assert_eq!(persist_count(&store), persists_before + 1);

    // The binding sticks for later calls.
    let err = engine.validate_at(&permanent.key, "B", 20).unwrap_err();
    assert!(matches!(err, EngineError::IdentityMismatch));
}

#[test]
fn validate_matching_binding_succeeds_without_mutation() {
    let (store, engine) = engine();
    let token = engine.issue_at("A", 0).unwrap().record.key;
    let persists_before = persist_count(&store);

    let record = engine.validate_at(&token, "A", 1).unwrap();
    assert!(record.is_bound_to("A"));
    assert_eq!(persist_count(&store), persists_before);
}

#[test]
fn permanent_record_validates_at_any_future_time() {
    let (_, engine, admin) = engine_with_admin();
    let permanent = admin.generate_permanent_at(0).unwrap();

    engine.validate_at(&permanent.key, "A", 1).unwrap();
    let far_future = i64::MAX - 1;
    let record = engine.validate_at(&permanent.key, "A", far_future).unwrap();
    assert!(record.is_permanent());
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn concurrent_issues_for_same_identity_yield_one_record() {
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        KeyGenerator::random("MINT"),
        DAY_MS,
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.issue_at("A", 0).unwrap())
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let created: Vec<_> = outcomes.iter().filter(|o| o.created).collect();
    assert_eq!(created.len(), 1, "exactly one request may win the race");

    let tokens: std::collections::HashSet<_> =
        outcomes.iter().map(|o| o.record.key.clone()).collect();
    assert_eq!(tokens.len(), 1, "all callers see the same token");
    assert_eq!(store.lock().unwrap().records().len(), 1);
}

// ── Derived mode ─────────────────────────────────────────────────

#[test]
fn derived_issue_after_expiry_replaces_colliding_expired_record() {
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let engine = LifecycleEngine::new(
        store.clone(),
        KeyGenerator::derived("MINT", "secret"),
        DAY_MS,
    );

    let first = engine.issue_at("A", 0).unwrap();
    let second = engine.issue_at("A", DAY_MS + 1).unwrap();

    // Same (identity, secret) derives the same token; the expired record
    // is replaced rather than duplicated.
    assert_eq!(first.record.key, second.record.key);
    assert_ne!(first.record.id, second.record.id);
    assert_eq!(store.lock().unwrap().records().len(), 1);
}

#[test]
fn derived_reissue_fails_while_identical_token_is_still_live() {
    use keymint_engine::AdminController;

    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let generator = KeyGenerator::derived("MINT", "secret");
    let engine = LifecycleEngine::new(store.clone(), generator.clone(), DAY_MS);
    let admin = AdminController::new(store, generator);

    let first = engine.issue_at("A", 0).unwrap();
    admin.reset_binding(first.record.id).unwrap();

    // The unbound record no longer matches the identity lookup, but the
    // derivation regenerates the exact same token, which is still live.
    // Retrying cannot help in derived mode, so issue is wedged for this
    // identity until the old record expires or is revoked.
    let err = engine.issue_at("A", 1).unwrap_err();
    assert!(matches!(err, EngineError::KeyGeneration(_)));

    // The identity can still re-claim the live record by validating it.
    let rebound = engine.validate_at(&first.record.key, "A", 2).unwrap();
    assert!(rebound.is_bound_to("A"));

    // Past expiry the collision resolves and issue works again.
    let fresh = engine.issue_at("A", DAY_MS + 1).unwrap();
    assert!(fresh.created);
    assert_eq!(fresh.record.key, first.record.key);
}
