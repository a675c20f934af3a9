//! Concurrent keyed storage for limiter instances.

use std::borrow::Borrow;
use std::hash::Hash;

use ahash::RandomState;
use dashmap::DashMap;

/// Thread-safe sharded map backed by DashMap.
///
/// DashMap provides lock-free reads and fine-grained locking for
/// writes. The `entry` API gives the atomic insert-if-absent primitive
/// the registry builds its get-or-create on: racing first accesses for
/// one key run exactly one factory and all observe the same value.
#[derive(Debug)]
pub struct ShardedMap<K, V>
where
    K: Eq + Hash,
{
    map: DashMap<K, V, RandomState>,
}

impl<K, V> ShardedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Fetch the value for `key`, running `factory` to create it if
    /// absent. The factory runs at most once per key, under the shard
    /// lock, even when callers race.
    pub fn get_or_insert_with(&self, key: K, factory: impl FnOnce() -> V) -> V {
        self.map.entry(key).or_insert_with(factory).value().clone()
    }

    /// Fetch the value for `key` without creating one.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Check if a key exists.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Remove a key and return its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(key)
    }

    /// Iterate over all entries with a callback.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for entry in self.map.iter() {
            f(entry.key(), entry.value());
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.map.clear();
    }
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
