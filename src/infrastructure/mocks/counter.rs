//! Mock rate counters for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::ports::{BackendError, RateCounter, WindowUsage};

/// In-memory sliding-log counter mirroring the distributed backend's
/// semantics: one timestamp log per key, trimmed to the window on each
/// record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounter {
    logs: Arc<Mutex<HashMap<String, VecDeque<u64>>>>,
}

impl InMemoryCounter {
    /// Create an in-memory counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<u64>>> {
        self.logs
            .lock()
            .expect("InMemoryCounter mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[async_trait]
impl RateCounter for InMemoryCounter {
    async fn record(
        &self,
        key: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<WindowUsage, BackendError> {
        let mut logs = self.lock();
        let log = logs.entry(key.to_string()).or_default();

        let min_ms = now_ms.saturating_sub(window_ms);
        while log.front().is_some_and(|&ts| ts <= min_ms) {
            log.pop_front();
        }
        log.push_back(now_ms);

        let reset_ms = log
            .front()
            .map(|&oldest| oldest.saturating_add(window_ms))
            .unwrap_or_else(|| now_ms.saturating_add(window_ms));

        Ok(WindowUsage {
            count: log.len() as u64,
            reset_ms,
        })
    }
}

/// Counter whose every operation fails, for exercising the fallback path.
#[derive(Debug, Clone, Default)]
pub struct FailingCounter;

impl FailingCounter {
    /// Create a failing counter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RateCounter for FailingCounter {
    async fn record(
        &self,
        _key: &str,
        _now_ms: u64,
        _window_ms: u64,
    ) -> Result<WindowUsage, BackendError> {
        Err(BackendError("injected counter failure".to_string()))
    }
}
