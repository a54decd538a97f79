//! Generic scoped cache implementation

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

/// Anything that can live in a [`ScopedCache`]
pub trait Entity: Clone + Send + Sync + 'static {
    /// Stable identifier; at most one cached entry exists per identifier
    fn id(&self) -> &str;
}

/// Thread-safe, last-write-wins map from identifier to entity snapshot
#[derive(Debug)]
pub struct ScopedCache<E> {
    entries: RwLock<HashMap<String, E>>,
}

impl<E: Entity> Default for ScopedCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> ScopedCache<E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    // A panic while holding the lock cannot leave the map half-written
    // (every mutation is a single insert), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, E>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, E>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite the entry for `entity.id()`
    pub fn upsert(&self, entity: E) {
        let id = entity.id().to_string();
        debug!(%id, "ScopedCache::upsert: called");
        self.write().insert(id, entity);
    }

    /// Upsert every entity under a single critical section
    pub fn upsert_all(&self, entities: impl IntoIterator<Item = E>) {
        let mut entries = self.write();
        for entity in entities {
            entries.insert(entity.id().to_string(), entity);
        }
        debug!(len = entries.len(), "ScopedCache::upsert_all: done");
    }

    /// Latest upserted value for `id`, if any
    pub fn get(&self, id: &str) -> Option<E> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Snapshot of every entry; order is unspecified
    pub fn list(&self) -> Vec<E> {
        self.read().values().cloned().collect()
    }

    /// Snapshot of the entries matching `predicate`; order is unspecified
    pub fn filter<P>(&self, predicate: P) -> Vec<E>
    where
        P: Fn(&E) -> bool,
    {
        self.read().values().filter(|e| predicate(e)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
