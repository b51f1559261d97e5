//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use crate::domain::window::WindowUsage;

/// Port for obtaining current wall-clock time as epoch milliseconds.
///
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Port for suspending a task between retry attempts.
///
/// Infrastructure provides concrete implementations (TokioSleeper,
/// MockSleeper).
#[async_trait]
pub trait Sleeper: Send + Sync + Debug {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// A counter or cache backend could not serve the request.
///
/// Never surfaced to handlers: the gate falls back to in-process counting
/// and the cache degrades to a pass-through.
#[derive(Debug, Clone, Error)]
#[error("backend unavailable: {0}")]
pub struct BackendError(pub String);

/// Port for the distributed sliding-window counter.
#[async_trait]
pub trait RateCounter: Send + Sync + Debug {
    /// Record one request against `key` and return the usage observed in the
    /// window ending at `now_ms`, including this request.
    async fn record(
        &self,
        key: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<WindowUsage, BackendError>;
}

/// Port for the distributed key-value cache store.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Fetch the raw value under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Store `value` under `key` with the given time-to-live.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), BackendError>;

    /// Delete one exact key. Returns the number of keys removed.
    async fn delete(&self, key: &str) -> Result<u64, BackendError>;

    /// Delete every key matching a glob-style pattern via the store's
    /// cursor-based scan. Returns the number of keys removed.
    async fn delete_matching(&self, pattern: &str) -> Result<u64, BackendError>;
}
