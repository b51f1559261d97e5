//! Startup configuration and wiring.
//!
//! The shaping components are constructed exactly once, at process startup,
//! and handed to request handlers by reference. There is no hidden lazy
//! initialization: a missing backend URL disables that subsystem up front
//! and the corresponding component runs in its degraded mode (in-process
//! fallback counting, pass-through cache).

use std::env;
use std::sync::Arc;

use tracing::warn;

use crate::application::cache::ReadThroughCache;
use crate::application::gate::RateLimitGate;
use crate::application::metrics::Metrics;
use crate::application::ports::{CacheStore, Clock, RateCounter};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::fallback::FallbackLimiter;

#[cfg(feature = "redis-backend")]
use crate::infrastructure::redis_cache::{RedisCacheConfig, RedisCacheStore};
#[cfg(feature = "redis-backend")]
use crate::infrastructure::redis_counter::{RedisCounterConfig, RedisSlidingCounter};

/// Environment variable naming the rate-counter Redis endpoint.
pub const RATELIMIT_URL_VAR: &str = "VOX_RATELIMIT_REDIS_URL";

/// Environment variable naming the cache-store Redis endpoint.
pub const CACHE_URL_VAR: &str = "VOX_CACHE_REDIS_URL";

/// Configuration for the shaping layer, read once at startup.
///
/// An absent URL disables that backend: the gate then counts in-process and
/// the cache becomes a pass-through.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Redis endpoint (with credentials) for the rate counter.
    pub counter_url: Option<String>,
    /// Redis endpoint (with credentials) for the cache store.
    pub cache_url: Option<String>,
    /// Key prefix for counter keys.
    pub counter_key_prefix: String,
    /// Key prefix for cached values.
    pub cache_key_prefix: String,
    /// Entry cap for the in-process fallback limiter.
    pub fallback_max_entries: usize,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            counter_url: None,
            cache_url: None,
            counter_key_prefix: "vox:rl:".to_string(),
            cache_key_prefix: "vox:cache:".to_string(),
            fallback_max_entries: FallbackLimiter::DEFAULT_MAX_ENTRIES,
        }
    }
}

impl ResilienceConfig {
    /// Read configuration from the environment.
    ///
    /// Empty values count as absent.
    pub fn from_env() -> Self {
        Self {
            counter_url: env::var(RATELIMIT_URL_VAR).ok().filter(|v| !v.is_empty()),
            cache_url: env::var(CACHE_URL_VAR).ok().filter(|v| !v.is_empty()),
            ..Self::default()
        }
    }
}

/// The wired shaping layer: one gate and one cache sharing a metrics handle.
///
/// Build it once at startup with [`ResilienceStack::connect`] (or
/// [`ResilienceStack::builder`] in tests) and pass it by reference.
#[derive(Debug)]
pub struct ResilienceStack {
    gate: RateLimitGate,
    cache: ReadThroughCache,
    metrics: Metrics,
}

impl ResilienceStack {
    /// Start building a stack with explicit components.
    pub fn builder() -> ResilienceStackBuilder {
        ResilienceStackBuilder::new()
    }

    /// Connect backends per `config` and wire the stack.
    ///
    /// Connection failures are logged and leave the affected subsystem in
    /// its degraded mode; this constructor itself never fails.
    pub async fn connect(config: ResilienceConfig) -> Self {
        let builder = Self::builder().with_fallback_max_entries(config.fallback_max_entries);

        #[cfg(feature = "redis-backend")]
        let builder = {
            let mut builder = builder;
            if let Some(url) = &config.counter_url {
                let counter_config = RedisCounterConfig {
                    key_prefix: config.counter_key_prefix.clone(),
                };
                match RedisSlidingCounter::connect_with_config(url, counter_config).await {
                    Ok(counter) => {
                        tracing::info!("rate counter connected");
                        builder = builder.with_counter(Arc::new(counter));
                    }
                    Err(error) => {
                        warn!(%error, "rate counter connection failed; in-process fallback only");
                    }
                }
            }
            if let Some(url) = &config.cache_url {
                let cache_config = RedisCacheConfig {
                    key_prefix: config.cache_key_prefix.clone(),
                };
                match RedisCacheStore::connect_with_config(url, cache_config).await {
                    Ok(store) => {
                        tracing::info!("cache store connected");
                        builder = builder.with_cache_store(Arc::new(store));
                    }
                    Err(error) => warn!(%error, "cache store connection failed; caching disabled"),
                }
            }
            builder
        };

        #[cfg(not(feature = "redis-backend"))]
        if config.counter_url.is_some() || config.cache_url.is_some() {
            warn!("redis endpoints configured but the redis-backend feature is disabled");
        }

        builder.build()
    }

    /// Connect backends per the process environment.
    pub async fn from_env() -> Self {
        Self::connect(ResilienceConfig::from_env()).await
    }

    /// The rate-limit gate.
    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    /// The read-through cache.
    pub fn cache(&self) -> &ReadThroughCache {
        &self.cache
    }

    /// Metrics shared by the gate, fallback limiter, and cache.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Builder wiring explicit components into a [`ResilienceStack`].
pub struct ResilienceStackBuilder {
    counter: Option<Arc<dyn RateCounter>>,
    store: Option<Arc<dyn CacheStore>>,
    clock: Arc<dyn Clock>,
    fallback_max_entries: usize,
}

impl ResilienceStackBuilder {
    /// Builder with no backends and the system clock.
    pub fn new() -> Self {
        Self {
            counter: None,
            store: None,
            clock: Arc::new(SystemClock::new()),
            fallback_max_entries: FallbackLimiter::DEFAULT_MAX_ENTRIES,
        }
    }

    /// Use a distributed rate counter.
    pub fn with_counter(mut self, counter: Arc<dyn RateCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Use a cache store.
    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the clock (tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the fallback limiter's entry cap.
    pub fn with_fallback_max_entries(mut self, max_entries: usize) -> Self {
        self.fallback_max_entries = max_entries;
        self
    }

    /// Wire the stack.
    pub fn build(self) -> ResilienceStack {
        let metrics = Metrics::new();
        let fallback = FallbackLimiter::with_max_entries(self.fallback_max_entries)
            .with_metrics(metrics.clone());
        let gate =
            RateLimitGate::new(self.counter, fallback, self.clock).with_metrics(metrics.clone());
        let cache = match self.store {
            Some(store) => ReadThroughCache::new(store),
            None => ReadThroughCache::disabled(),
        }
        .with_metrics(metrics.clone());

        ResilienceStack {
            gate,
            cache,
            metrics,
        }
    }
}

impl Default for ResilienceStackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bucket::Bucket;
    use crate::domain::identity::CallerIdentity;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = ResilienceConfig::default();
        assert!(config.counter_url.is_none());
        assert!(config.cache_url.is_none());
        assert_eq!(config.fallback_max_entries, 10_000);
    }

    #[tokio::test]
    async fn test_unconfigured_stack_degrades() {
        let stack = ResilienceStack::connect(ResilienceConfig::default()).await;

        assert!(!stack.cache().is_enabled());

        // The gate still limits via the in-process fallback.
        let bucket = Bucket::custom("test", 1, Duration::from_secs(60));
        let identity = CallerIdentity::user("u1");
        assert!(stack.gate().check(&bucket, &identity).await.admitted);
        assert!(!stack.gate().check(&bucket, &identity).await.admitted);
        assert_eq!(stack.metrics().fallback_decisions(), 2);
    }
}
