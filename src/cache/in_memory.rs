use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::key::CacheKey;
use super::store::CacheStore;
use super::value::CacheValue;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    stale: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    epochs: HashMap<CacheKey, u64>,
    clears: u64,
}

/// In-memory cache backed by `Arc<RwLock<HashMap>>`.
///
/// Clone-friendly (cloning shares the same underlying storage).
/// A poisoned lock is recovered rather than reported, so the store stays
/// infallible.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    state: Arc<RwLock<CacheState>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.read().entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: CacheKey, value: CacheValue) {
        self.write()
            .entries
            .insert(key, CacheEntry { value, stale: false });
    }

    fn invalidate(&self, key: &CacheKey) -> bool {
        let mut state = self.write();
        *state.epochs.entry(key.clone()).or_insert(0) += 1;
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    fn is_stale(&self, key: &CacheKey) -> bool {
        self.read()
            .entries
            .get(key)
            .map(|entry| entry.stale)
            .unwrap_or(true)
    }

    fn epoch(&self, key: &CacheKey) -> u64 {
        let state = self.read();
        state.epochs.get(key).copied().unwrap_or(0) + state.clears
    }

    fn remove(&self, key: &CacheKey) -> Option<CacheValue> {
        self.write().entries.remove(key).map(|entry| entry.value)
    }

    fn clear(&self) {
        let mut state = self.write();
        state.entries.clear();
        state.clears += 1;
    }

    fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}
