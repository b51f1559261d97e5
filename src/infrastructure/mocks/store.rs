//! Mock cache stores for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{BackendError, CacheStore, Clock};

#[derive(Debug, Clone)]
struct StoredEntry {
    bytes: Vec<u8>,
    expires_at_ms: u64,
}

/// In-memory cache store honoring TTLs against an injected clock.
///
/// Pattern matching for `delete_matching` supports a single `*` wildcard,
/// which covers the prefix patterns the key builders produce.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, StoredEntry>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create a store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `key` holds an unexpired entry.
    pub fn contains(&self, key: &str) -> bool {
        let now_ms = self.clock.now_ms();
        self.lock()
            .get(key)
            .is_some_and(|entry| entry.expires_at_ms > now_ms)
    }

    /// Overwrite `key` with raw bytes (for corrupt-entry tests).
    pub fn insert_raw(&self, key: &str, bytes: Vec<u8>, ttl: Duration) {
        let expires_at_ms = self.clock.now_ms() + ttl.as_millis() as u64;
        self.lock().insert(
            key.to_string(),
            StoredEntry {
                bytes,
                expires_at_ms,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredEntry>> {
        self.entries
            .lock()
            .expect("InMemoryStore mutex poisoned - a test thread panicked while holding the lock")
    }
}

fn glob_match(pattern: &str, key: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == key,
        Some((prefix, suffix)) => {
            key.len() >= prefix.len() + suffix.len()
                && key.starts_with(prefix)
                && key.ends_with(suffix)
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let now_ms = self.clock.now_ms();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > now_ms => Ok(Some(entry.bytes.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), BackendError> {
        let expires_at_ms = self.clock.now_ms() + ttl.as_millis() as u64;
        self.lock().insert(
            key.to_string(),
            StoredEntry {
                bytes: value,
                expires_at_ms,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64, BackendError> {
        Ok(self.lock().remove(key).map_or(0, |_| 1))
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, BackendError> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        Ok((before - entries.len()) as u64)
    }
}

/// Store whose every operation fails, for exercising degraded mode.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl FailingStore {
    /// Create a failing store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Err(BackendError("injected store failure".to_string()))
    }

    async fn put(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), BackendError> {
        Err(BackendError("injected store failure".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<u64, BackendError> {
        Err(BackendError("injected store failure".to_string()))
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<u64, BackendError> {
        Err(BackendError("injected store failure".to_string()))
    }
}
