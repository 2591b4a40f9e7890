//! Shared test helpers for engine tests.

#![allow(dead_code)]

use keymint_engine::{AdminController, KeyGenerator, LifecycleEngine, DEFAULT_LIFETIME_MS};
use keymint_store::MemoryStore;
use std::sync::{Arc, Mutex};

pub const DAY_MS: i64 = 86_400_000;

/// Engine over a fresh in-memory store with the default 24h lifetime.
pub fn engine() -> (Arc<Mutex<MemoryStore>>, LifecycleEngine<MemoryStore>) {
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let engine = LifecycleEngine::new(
        store.clone(),
        KeyGenerator::random("MINT"),
        DEFAULT_LIFETIME_MS,
    );
    (store, engine)
}

/// Engine plus an admin controller sharing the same store.
pub fn engine_with_admin() -> (
    Arc<Mutex<MemoryStore>>,
    LifecycleEngine<MemoryStore>,
    AdminController<MemoryStore>,
) {
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let generator = KeyGenerator::random("MINT");
    let engine = LifecycleEngine::new(store.clone(), generator.clone(), DEFAULT_LIFETIME_MS);
    let admin = AdminController::new(store.clone(), generator);
    (store, engine, admin)
}

pub fn persist_count(store: &Arc<Mutex<MemoryStore>>) -> u64 {
    store.lock().unwrap().persist_count()
}
