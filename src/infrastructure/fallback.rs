//! In-process fallback limiter.
//!
//! Enforces a fixed-window limit from process-local state when the
//! distributed counter is unconfigured or unreachable. Bounded: at a size
//! threshold, expired windows are swept and, if the map is still full, the
//! window closest to its reset is evicted.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::application::metrics::Metrics;
use crate::domain::window::{WindowState, WindowUsage};

/// Process-local fixed-window limiter keyed by `"<bucket>:<identity>"`.
///
/// Mutations go through DashMap's entry API, so one check is a single
/// atomic read-modify-write per key with no suspension in between.
#[derive(Debug)]
pub struct FallbackLimiter {
    windows: DashMap<String, WindowState>,
    max_entries: usize,
    metrics: Metrics,
}

impl FallbackLimiter {
    /// Default cap on tracked identities before sweeping.
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

    /// Limiter with the default entry cap.
    pub fn new() -> Self {
        Self::with_max_entries(Self::DEFAULT_MAX_ENTRIES)
    }

    /// Limiter with a custom entry cap.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            windows: DashMap::new(),
            max_entries,
            metrics: Metrics::new(),
        }
    }

    /// Share a metrics handle with other components.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Count one request against `key`, opening or reopening its window as
    /// needed, and return the usage including this request.
    pub fn record(&self, key: &str, now_ms: u64, window_ms: u64) -> WindowUsage {
        if self.windows.len() >= self.max_entries && !self.windows.contains_key(key) {
            self.sweep(now_ms);
        }

        match self.windows.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().record(now_ms, window_ms),
            Entry::Vacant(vacant) => {
                let state = WindowState::open(now_ms, window_ms);
                let usage = state.usage();
                vacant.insert(state);
                usage
            }
        }
    }

    /// Number of tracked identities.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no identities are tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Drop all tracked windows.
    pub fn clear(&self) {
        self.windows.clear();
    }

    fn sweep(&self, now_ms: u64) {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now_ms));
        let dropped = before - self.windows.len();
        if dropped > 0 {
            debug!(dropped, "swept expired rate-limit windows");
        }

        if self.windows.len() >= self.max_entries {
            // Still full of live windows: evict the one ending soonest.
            let victim = self
                .windows
                .iter()
                .min_by_key(|entry| entry.value().reset_at_ms())
                .map(|entry| entry.key().clone());
            if let Some(key) = victim {
                self.windows.remove(&key);
                self.metrics.record_eviction();
            }
        }
    }
}

impl Default for FallbackLimiter {
    fn default() -> Self {
        Self::new()
    }
}
