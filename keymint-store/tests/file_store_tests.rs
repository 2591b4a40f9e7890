use keymint_store::{JsonFileStore, KeyStore, MemoryStore};
use keymint_types::LicenseRecord;
use tempfile::tempdir;

fn record(key: &str, hwid: Option<&str>, created_at: i64) -> LicenseRecord {
    LicenseRecord::new(
        key.to_string(),
        hwid.map(str::to_string),
        created_at,
        Some(created_at + 86_400_000),
    )
}

// ── Load behavior ────────────────────────────────────────────────

#[test]
fn missing_file_yields_empty_store() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::load(dir.path().join("keys.json"));
    assert!(store.records().is_empty());
}

#[test]
fn corrupt_file_yields_empty_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let store = JsonFileStore::load(&path);
    assert!(store.records().is_empty());
}

#[test]
fn persist_then_reload_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys.json");

    let rec = record("MINT-aaa", Some("hwid-1"), 100);
    {
        let mut store = JsonFileStore::load(&path);
        store.upsert(rec.clone());
        store.persist().unwrap();
    }

    let store = JsonFileStore::load(&path);
    assert_eq!(store.records(), vec![rec]);
}

#[test]
fn persist_overwrites_whole_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys.json");

    let a = record("MINT-aaa", None, 100);
    let b = record("MINT-bbb", None, 200);

    let mut store = JsonFileStore::load(&path);
    store.upsert(a.clone());
    store.upsert(b.clone());
    store.persist().unwrap();

    store.remove(a.id);
    store.persist().unwrap();

    let reloaded = JsonFileStore::load(&path);
    assert_eq!(reloaded.records(), vec![b]);
}

#[test]
fn persist_failure_surfaces_as_io_error() {
    use keymint_store::StoreError;

    // The backing path is a directory: the snapshot rename cannot land.
    let dir = tempdir().unwrap();
    let mut store = JsonFileStore::load(dir.path());
    store.upsert(record("MINT-aaa", None, 100));

    let err = store.persist().unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}

// ── Lookups ──────────────────────────────────────────────────────

#[test]
fn find_by_token_and_id() {
    let dir = tempdir().unwrap();
    let mut store = JsonFileStore::load(dir.path().join("keys.json"));

    let rec = record("MINT-find-me", None, 100);
    store.upsert(rec.clone());

    assert_eq!(store.find_by_token("MINT-find-me"), Some(rec.clone()));
    assert_eq!(store.find_by_id(rec.id), Some(rec));
    assert_eq!(store.find_by_token("MINT-missing"), None);
}

#[test]
fn find_by_identity_prefers_most_recent() {
    let older = record("MINT-old", Some("hwid-1"), 100);
    let newer = record("MINT-new", Some("hwid-1"), 200);

    let store = MemoryStore::with_records(vec![older, newer.clone()]);
    assert_eq!(store.find_by_identity("hwid-1"), Some(newer));
}

#[test]
fn find_by_identity_ignores_unbound_records() {
    let unbound = record("MINT-unbound", None, 100);
    let store = MemoryStore::with_records(vec![unbound]);
    assert_eq!(store.find_by_identity("hwid-1"), None);
}

// ── Mutations ────────────────────────────────────────────────────

#[test]
fn upsert_replaces_record_with_same_id() {
    let mut store = MemoryStore::new();
    let mut rec = record("MINT-aaa", None, 100);
    store.upsert(rec.clone());

    rec.bind("hwid-1");
    store.upsert(rec.clone());

    assert_eq!(store.records().len(), 1);
    assert_eq!(store.find_by_id(rec.id), Some(rec));
}

#[test]
fn remove_reports_whether_record_existed() {
    let mut store = MemoryStore::new();
    let rec = record("MINT-aaa", None, 100);
    store.upsert(rec.clone());

    assert!(store.remove(rec.id));
    assert!(!store.remove(rec.id));
    assert!(store.records().is_empty());
}

#[test]
fn memory_store_counts_persists() {
    let mut store = MemoryStore::new();
    assert_eq!(store.persist_count(), 0);
    store.persist().unwrap();
    store.persist().unwrap();
    assert_eq!(store.persist_count(), 2);
}
