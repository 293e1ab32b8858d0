use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Cache-aside store for entity lookups.
///
/// The relational store stays authoritative: callers populate entries after a
/// successful read and put or evict them after every committed write. There is
/// no TTL and no size bound; entries leave only through [`EntityCache::evict`]
/// or [`EntityCache::clear`]. Clones share the same underlying map.
pub struct EntityCache<K, V> {
    name: &'static str,
    entries: Arc<DashMap<K, V>>,
}

impl<K, V> Clone for EntityCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let hit = self.entries.get(key).map(|entry| entry.value().clone());
        tracing::trace!(cache = self.name, ?key, hit = hit.is_some(), "cache lookup");
        hit
    }

    pub fn put(&self, key: K, value: V) {
        tracing::trace!(cache = self.name, ?key, "cache put");
        self.entries.insert(key, value);
    }

    pub fn evict(&self, key: &K) {
        if self.entries.remove(key).is_some() {
            tracing::trace!(cache = self.name, ?key, "cache evict");
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        tracing::debug!(cache = self.name, "cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
