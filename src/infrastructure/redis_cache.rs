//! Redis-backed cache store.
//!
//! A thin `CacheStore` adapter over `redis::aio::ConnectionManager`. Values
//! are opaque byte strings with server-side TTLs; pattern invalidation walks
//! the keyspace with cursor-based SCAN and bulk-deletes matches.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::RwLock;

use crate::application::ports::{BackendError, CacheStore};

/// Configuration for the Redis cache store.
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Key prefix for cached values (default: "vox:cache:")
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "vox:cache:".to_string(),
        }
    }
}

/// Distributed key-value store for the read-through cache.
pub struct RedisCacheStore {
    connection: Arc<RwLock<ConnectionManager>>,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisCacheStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisCacheConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisCacheConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            config,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }
}

impl Clone for RedisCacheStore {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let key = self.key(key);
        let mut conn = self.connection.write().await;
        let bytes: Option<Vec<u8>> = conn.get(&key).await.map_err(BackendError::from)?;
        Ok(bytes)
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), BackendError> {
        let key = self.key(key);
        let ttl_secs = ttl.as_secs().max(1);
        let mut conn = self.connection.write().await;
        conn.set_ex::<_, _, ()>(&key, value, ttl_secs)
            .await
            .map_err(BackendError::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64, BackendError> {
        let key = self.key(key);
        let mut conn = self.connection.write().await;
        let removed: u64 = conn.del(&key).await.map_err(BackendError::from)?;
        Ok(removed)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, BackendError> {
        let pattern = self.key(pattern);
        let mut conn = self.connection.write().await;
        let mut removed: u64 = 0;

        // Cursor-based SCAN so large keyspaces are walked incrementally.
        let mut cursor: u64 = 0;
        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await
                .map_err(BackendError::from)?;

            if !keys.is_empty() {
                let batch: u64 = conn.del(&keys).await.map_err(BackendError::from)?;
                removed += batch;
            }

            if new_cursor == 0 {
                break;
            }
            cursor = new_cursor;
        }

        Ok(removed)
    }
}
