//! Read-through cache over the distributed key-value store.
//!
//! Wraps a fetch function with get-or-populate semantics. The cache never
//! introduces a failure mode of its own: an unconfigured or erroring store
//! degrades to always invoking the fetch function, and the write-back after
//! a miss is fire-and-forget.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::application::metrics::Metrics;
use crate::application::ports::CacheStore;

/// Get-or-populate cache with an explicit invalidation contract.
///
/// Values are stored as JSON documents. Two concurrent misses on one key may
/// both invoke the fetch function and both write back (last write wins);
/// suitable for idempotent, eventually-consistent reads such as subscription
/// snapshots, not for read-modify-write counters.
///
/// # Example
/// ```no_run
/// use vox_resilience::{ReadThroughCache, domain::keys};
/// use std::time::Duration;
///
/// # async fn demo(cache: &ReadThroughCache) -> Result<(), std::io::Error> {
/// let tier: String = cache
///     .get_or_fetch(&keys::subscription("u1"), Duration::from_secs(1800), || async {
///         Ok::<_, std::io::Error>("pro".to_string())
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ReadThroughCache {
    store: Option<Arc<dyn CacheStore>>,
    metrics: Metrics,
}

impl ReadThroughCache {
    /// Cache backed by a store.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store: Some(store),
            metrics: Metrics::new(),
        }
    }

    /// Cache with no backing store: every read invokes the fetch function.
    pub fn disabled() -> Self {
        Self {
            store: None,
            metrics: Metrics::new(),
        }
    }

    /// Share a metrics handle with other components.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Whether a backing store is configured.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Return the cached value under `key`, or fetch, write back, and return.
    ///
    /// On a hit the fetch function is not invoked. On a miss the fresh value
    /// is returned regardless of whether the write-back (spawned, best
    /// effort) succeeds. A corrupt entry is discarded and treated as a miss.
    /// The only error this method can return is the fetch function's own.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let Some(store) = &self.store else {
            return fetch().await;
        };

        match store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.metrics.record_cache_hit();
                    return Ok(value);
                }
                Err(error) => {
                    warn!(%error, key, "corrupt cache entry, discarding");
                    if let Err(error) = store.delete(key).await {
                        warn!(%error, key, "failed to discard corrupt cache entry");
                    }
                }
            },
            Ok(None) => {}
            Err(error) => {
                warn!(%error, key, "cache store unavailable, bypassing");
                self.metrics.record_cache_error();
            }
        }

        self.metrics.record_cache_miss();
        let value = fetch().await?;

        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                let store = Arc::clone(store);
                let key = key.to_string();
                tokio::spawn(async move {
                    if let Err(error) = store.put(&key, bytes, ttl).await {
                        warn!(%error, key, "cache write-back failed");
                    }
                });
            }
            Err(error) => warn!(%error, key, "cache value not serializable, skipping write-back"),
        }

        Ok(value)
    }

    /// Delete one exact key. Returns the number of keys removed.
    ///
    /// Call after any write that changes the cached source of truth; there
    /// is no automatic write-through.
    pub async fn invalidate(&self, key: &str) -> u64 {
        let Some(store) = &self.store else {
            return 0;
        };
        match store.delete(key).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(%error, key, "cache invalidation failed");
                self.metrics.record_cache_error();
                0
            }
        }
    }

    /// Delete every key matching a glob-style pattern. Returns the number of
    /// keys removed.
    pub async fn invalidate_matching(&self, pattern: &str) -> u64 {
        let Some(store) = &self.store else {
            return 0;
        };
        match store.delete_matching(pattern).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(%error, pattern, "cache pattern invalidation failed");
                self.metrics.record_cache_error();
                0
            }
        }
    }

    /// Metrics collected by this cache.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
