//! Redis-backed sliding-window counter.
//!
//! Keeps one sorted set per `"<bucket>:<identity>"` key: members are unique
//! request markers scored by arrival time in epoch milliseconds. Each check
//! runs a single atomic pipeline (trim, add, count, oldest, expire), so the
//! window slides continuously and state is shared across all application
//! instances.
//!
//! ## Important limitations
//!
//! - Rejected requests still add a member, so sustained over-limit traffic
//!   keeps the window saturated until it drains.
//! - Redis failures are returned to the gate, which logs a warning and
//!   falls back to in-process counting; they never reach handlers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tokio::sync::RwLock;

use crate::application::ports::{BackendError, RateCounter, WindowUsage};

impl From<RedisError> for BackendError {
    fn from(error: RedisError) -> Self {
        BackendError(error.to_string())
    }
}

/// Configuration for the Redis counter.
#[derive(Debug, Clone)]
pub struct RedisCounterConfig {
    /// Key prefix for counter keys (default: "vox:rl:")
    pub key_prefix: String,
}

impl Default for RedisCounterConfig {
    fn default() -> Self {
        Self {
            key_prefix: "vox:rl:".to_string(),
        }
    }
}

/// Distributed sliding-window counter for the rate-limit gate.
pub struct RedisSlidingCounter {
    connection: Arc<RwLock<ConnectionManager>>,
    config: RedisCounterConfig,
    /// Process tag keeping members unique across application instances
    instance: u32,
    /// Per-process tag keeping members unique within one millisecond
    sequence: AtomicU64,
}

impl fmt::Debug for RedisSlidingCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSlidingCounter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisSlidingCounter {
    /// Connect to Redis with default configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisCounterConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisCounterConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            config,
            instance: rand::random(),
            sequence: AtomicU64::new(0),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }
}

impl Clone for RedisSlidingCounter {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            config: self.config.clone(),
            instance: self.instance,
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl RateCounter for RedisSlidingCounter {
    async fn record(
        &self,
        key: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<WindowUsage, BackendError> {
        let key = self.key(key);
        let member = format!(
            "{now_ms}-{:08x}-{}",
            self.instance,
            self.sequence.fetch_add(1, Ordering::Relaxed)
        );
        let min_score = now_ms.saturating_sub(window_ms);

        let mut conn = self.connection.write().await;
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd("ZREMRANGEBYSCORE")
            .arg(&key)
            .arg(0)
            .arg(min_score)
            .ignore();
        pipe.cmd("ZADD").arg(&key).arg(now_ms).arg(&member).ignore();
        pipe.cmd("ZCARD").arg(&key);
        pipe.cmd("ZRANGE").arg(&key).arg(0).arg(0).arg("WITHSCORES");
        pipe.cmd("PEXPIRE").arg(&key).arg(window_ms).ignore();

        let (count, oldest): (u64, Vec<(String, u64)>) =
            pipe.query_async(&mut *conn).await.map_err(BackendError::from)?;

        let reset_ms = oldest
            .first()
            .map(|(_, score)| score.saturating_add(window_ms))
            .unwrap_or_else(|| now_ms.saturating_add(window_ms));

        Ok(WindowUsage { count, reset_ms })
    }
}
