//! Response cache combining a key-value store with request coalescing.

use std::future::Future;
use std::sync::Arc;

use super::fingerprint::RequestFingerprint;
use super::single_flight::SingleFlight;
use super::store::{CacheStats, KeyValueStore, LruStore};

/// Caches successful responses by request fingerprint.
///
/// A lookup returns the stored value, joins a fetch already running for the
/// same fingerprint, or starts a new fetch. Only `Ok` results are stored,
/// so a failed fetch is retried by the next caller.
pub struct ResponseCache<V, E, S = LruStore<RequestFingerprint, V>>
where
    V: Clone,
    E: Clone,
{
    store: Arc<S>,
    flights: SingleFlight<RequestFingerprint, Result<V, E>>,
}

impl<V, E> ResponseCache<V, E, LruStore<RequestFingerprint, V>>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates a cache backed by an in-memory LRU store.
    pub fn new(capacity: usize) -> Self {
        Self::with_store(LruStore::new(capacity))
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}

impl<V, E, S> ResponseCache<V, E, S>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    S: KeyValueStore<RequestFingerprint, V> + 'static,
{
    /// Creates a cache over a caller-supplied store.
    pub fn with_store(store: S) -> Self {
        Self {
            store: Arc::new(store),
            flights: SingleFlight::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, key: &RequestFingerprint) -> Option<V> {
        self.store.get(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn invalidate(&self, key: &RequestFingerprint) -> Option<V> {
        self.store.remove(key)
    }

    /// Returns the cached value for `key` or runs `fetch` to produce it.
    ///
    /// Concurrent calls with the same key while a fetch is running share
    /// that fetch and its result.
    pub async fn get_or_fetch<F, Fut>(&self, key: &RequestFingerprint, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(value) = self.store.get(key) {
            tracing::debug!(fingerprint = %key.short(), "response cache hit");
            return Ok(value);
        }
        tracing::debug!(fingerprint = %key.short(), "response cache miss");

        let store = Arc::clone(&self.store);
        let store_key = key.clone();
        self.flights
            .run(key.clone(), move || {
                let pending = fetch();
                async move {
                    let result = pending.await;
                    if let Ok(value) = &result {
                        store.put(store_key, value.clone());
                    }
                    result
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(n: u32) -> RequestFingerprint {
        RequestFingerprint::from_content(&n.to_string())
    }

    #[tokio::test]
    async fn test_second_lookup_hits() {
        let cache: ResponseCache<String, String> = ResponseCache::new(8);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let value = cache
                .get_or_fetch(&key(1), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("fresh".to_string())
                })
                .await;
            assert_eq!(value, Ok("fresh".to_string()));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: ResponseCache<u32, String> = ResponseCache::new(8);

        let first = cache
            .get_or_fetch(&key(1), || async { Err("boom".to_string()) })
            .await;
        assert_eq!(first, Err("boom".to_string()));
        assert!(cache.is_empty());

        let second = cache.get_or_fetch(&key(1), || async { Ok(7) }).await;
        assert_eq!(second, Ok(7));
        assert_eq!(cache.get(&key(1)), Some(7));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache: ResponseCache<u32, String> = ResponseCache::new(8);
        cache.get_or_fetch(&key(1), || async { Ok(1) }).await.unwrap();
        assert_eq!(cache.invalidate(&key(1)), Some(1));

        let value = cache.get_or_fetch(&key(1), || async { Ok(2) }).await;
        assert_eq!(value, Ok(2));
    }

    #[tokio::test]
    async fn test_capacity_bounds_entries() {
        let cache: ResponseCache<u32, String> = ResponseCache::new(2);
        for n in 0..5 {
            cache.get_or_fetch(&key(n), move || async move { Ok(n) }).await.unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 3);
    }
}
