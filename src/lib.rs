//! # vox-resilience
//!
//! Request shaping for the Vox API: every inbound handler composes the same
//! three independent components from this crate.
//!
//! 1. **Rate-limit gate** — derives a caller identity, consults a
//!    distributed sliding-window counter (Redis), and returns an
//!    admit/reject decision with standard `X-RateLimit-*` headers. When the
//!    counter is unreachable the gate fails secure: a process-local
//!    fixed-window fallback keeps enforcing a (weaker) limit instead of
//!    switching limiting off.
//! 2. **Retry executor** — wraps a fallible async operation, retries
//!    transient failures with capped exponential backoff and jitter, and
//!    surfaces exhaustion as a distinguished error carrying the attempt
//!    count.
//! 3. **Read-through cache** — get-or-populate over a distributed key-value
//!    store with TTLs, fire-and-forget write-backs, and explicit
//!    invalidation. An unavailable store degrades the cache to a
//!    pass-through; it never fails a request.
//!
//! The components share no state and compose only because handlers call
//! them in sequence: gate first, then retry around the provider call, then
//! the cache around data reads.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vox_resilience::{Bucket, CallerIdentity, ResilienceStack, RetryPolicy};
//! use vox_resilience::domain::{classify::UpstreamStatus, keys};
//! use std::time::Duration;
//!
//! # async fn handle_chat_request() {
//! // Wired once at startup; absent backend URLs select degraded modes.
//! let stack = ResilienceStack::from_env().await;
//!
//! // Gate the request.
//! let identity = CallerIdentity::derive(Some("u42"), None, None);
//! let decision = stack.gate().check(&Bucket::chat(), &identity).await;
//! if !decision.admitted {
//!     let _body = decision.rejection();
//!     let _headers = decision.headers();
//!     return; // respond 429
//! }
//!
//! // Wrap the provider call in a retry policy.
//! let policy = RetryPolicy::<UpstreamStatus>::new().with_max_retries(2);
//! let _reply = policy
//!     .execute(|| async { Ok::<_, UpstreamStatus>("completion".to_string()) })
//!     .await;
//!
//! // Serve reads through the cache.
//! let _tier: String = stack
//!     .cache()
//!     .get_or_fetch(&keys::subscription("u42"), Duration::from_secs(1800), || async {
//!         Ok::<_, UpstreamStatus>("pro".to_string())
//!     })
//!     .await
//!     .unwrap();
//! # }
//! ```
//!
//! ## Degradation contract
//!
//! Backend failures never reach handlers. The gate logs a warning and falls
//! back to in-process counting; the cache logs a warning and invokes the
//! fetch function directly. Only the retry executor and the gate produce
//! caller-visible outcomes: [`RetryError`] and [`RateLimitDecision`].
//!
//! ## Testing
//!
//! Enable the `test-helpers` feature for a controllable clock, a recording
//! sleeper, and in-memory/failing backends (see
//! [`infrastructure::mocks`](crate::infrastructure)).

// Domain layer - pure shaping logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    backoff::BackoffSchedule,
    bucket::Bucket,
    classify::UpstreamStatus,
    identity::CallerIdentity,
    keys,
    window::{WindowState, WindowUsage},
};

pub use application::{
    cache::ReadThroughCache,
    gate::{
        RateLimitDecision, RateLimitGate, RateLimitRejection, RATE_LIMIT_EXCEEDED,
        REJECTION_STATUS,
    },
    metrics::{Metrics, MetricsSnapshot},
    ports::{BackendError, CacheStore, Clock, RateCounter, Sleeper},
    retry::{RetryError, RetryPolicy},
};

pub use infrastructure::{
    clock::SystemClock,
    config::{ResilienceConfig, ResilienceStack, ResilienceStackBuilder},
    fallback::FallbackLimiter,
    sleeper::TokioSleeper,
};

#[cfg(feature = "redis-backend")]
pub use infrastructure::{
    redis_cache::{RedisCacheConfig, RedisCacheStore},
    redis_counter::{RedisCounterConfig, RedisSlidingCounter},
};
