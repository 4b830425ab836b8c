//! Key-value stores for cached responses.
//!
//! [`KeyValueStore`] is the seam callers inject; [`LruStore`] is the
//! bounded in-memory implementation.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// A synchronous key-value store shared between tasks.
pub trait KeyValueStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    fn put(&self, key: K, value: V);

    fn remove(&self, key: &K) -> Option<V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hit, miss and eviction counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate between 0.0 and 1.0, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

#[derive(Debug)]
struct LruEntry<V> {
    value: V,
    last_accessed: u64,
}

/// Bounded store that evicts the least recently used entry when full.
///
/// Recency is tracked with a logical clock bumped on every `get` hit and
/// every `put`.
#[derive(Debug)]
pub struct LruStore<K, V> {
    entries: RwLock<HashMap<K, LruEntry<V>>>,
    capacity: usize,
    clock: AtomicU64,
    stats: RwLock<CacheStats>,
}

impl<K, V> LruStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a store holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().expect("stats read lock poisoned").clone()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .read()
            .expect("cache read lock poisoned")
            .contains_key(key)
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .expect("cache write lock poisoned")
            .clear();
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_oldest(&self, entries: &mut HashMap<K, LruEntry<V>>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            entries.remove(&key);
            self.stats.write().expect("stats write lock poisoned").evictions += 1;
            tracing::debug!(capacity = self.capacity, "evicted least recently used cache entry");
        }
    }
}

impl<K, V> KeyValueStore<K, V> for LruStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().expect("cache write lock poisoned");
        let found = entries.get_mut(key).map(|entry| {
            entry.last_accessed = self.tick();
            entry.value.clone()
        });

        let mut stats = self.stats.write().expect("stats write lock poisoned");
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    fn put(&self, key: K, value: V) {
        let mut entries = self.entries.write().expect("cache write lock poisoned");
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            self.evict_oldest(&mut entries);
        }

        entries.insert(
            key,
            LruEntry {
                value,
                last_accessed: self.tick(),
            },
        );
        self.stats.write().expect("stats write lock poisoned").insertions += 1;
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.entries
            .write()
            .expect("cache write lock poisoned")
            .remove(key)
            .map(|entry| entry.value)
    }

    fn len(&self) -> usize {
        self.entries.read().expect("cache read lock poisoned").len()
    }
}
