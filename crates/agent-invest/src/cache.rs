//! Time-bounded caching of upstream responses

use cached::{Cached, TimedCache};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Cache key for an upstream request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Stock symbol
    pub symbol: String,
    /// Endpoint or dataset name
    pub endpoint: &'static str,
    /// Request parameters beyond the symbol
    pub params: String,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, endpoint: &'static str, params: impl fmt::Display) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint,
            params: params.to_string(),
        }
    }
}

/// Thread-safe TTL cache shared by clones
///
/// Concurrent misses on one key share a single upstream fetch.
pub struct MetricCache<V> {
    cache: Arc<RwLock<TimedCache<CacheKey, V>>>,
    inflight: Arc<Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>>,
}

impl<V: Clone> MetricCache<V> {
    /// Create a new cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get a live value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        // TimedCache evicts on read, so lookups need the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: CacheKey, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value, or run `fetcher` and cache its success
    ///
    /// Callers missing on the same key wait for the first caller's fetch and
    /// reuse its value. Failures are not cached, so a waiter whose leader
    /// failed runs its own `fetcher`.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            debug!(symbol = %key.symbol, endpoint = key.endpoint, "Cache hit");
            return Ok(value);
        }

        let gate = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(inflight.entry(key.clone()).or_default())
        };

        let result = {
            let _turn = gate.lock().await;
            if let Some(value) = self.get(&key).await {
                debug!(symbol = %key.symbol, endpoint = key.endpoint, "Cache hit after wait");
                Ok(value)
            } else {
                debug!(symbol = %key.symbol, endpoint = key.endpoint, "Cache miss");
                let fetched = fetcher().await;
                if let Ok(value) = &fetched {
                    self.insert(key.clone(), value.clone()).await;
                }
                fetched
            }
        };

        // Last one out removes the gate; the map holds the other reference
        let mut inflight = self.inflight.lock().await;
        if Arc::strong_count(&gate) == 2 {
            inflight.remove(&key);
        }

        result
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Clone for MetricCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<V> fmt::Debug for MetricCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricCache").finish_non_exhaustive()
    }
}
