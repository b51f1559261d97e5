//! Observability metrics for the shaping layer.
//!
//! Provides counters about gate and cache behavior for monitoring and
//! debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking shaping-layer statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same underlying counters, so one `Metrics` can be
/// handed to the gate, the fallback limiter, and the cache.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Requests admitted by the gate
    requests_admitted: AtomicU64,
    /// Requests rejected by the gate
    requests_rejected: AtomicU64,
    /// Gate decisions served by the in-process fallback
    fallback_decisions: AtomicU64,
    /// Fallback windows evicted under memory pressure
    windows_evicted: AtomicU64,
    /// Cache reads answered from the store
    cache_hits: AtomicU64,
    /// Cache reads that invoked the fetch function
    cache_misses: AtomicU64,
    /// Cache store operations that failed
    cache_errors: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                requests_admitted: AtomicU64::new(0),
                requests_rejected: AtomicU64::new(0),
                fallback_decisions: AtomicU64::new(0),
                windows_evicted: AtomicU64::new(0),
                cache_hits: AtomicU64::new(0),
                cache_misses: AtomicU64::new(0),
                cache_errors: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.requests_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.inner.fallback_decisions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.inner.windows_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_error(&self) {
        self.inner.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests admitted by the gate.
    pub fn requests_admitted(&self) -> u64 {
        self.inner.requests_admitted.load(Ordering::Relaxed)
    }

    /// Requests rejected by the gate.
    pub fn requests_rejected(&self) -> u64 {
        self.inner.requests_rejected.load(Ordering::Relaxed)
    }

    /// Gate decisions served by the in-process fallback.
    pub fn fallback_decisions(&self) -> u64 {
        self.inner.fallback_decisions.load(Ordering::Relaxed)
    }

    /// Fallback windows evicted under memory pressure.
    pub fn windows_evicted(&self) -> u64 {
        self.inner.windows_evicted.load(Ordering::Relaxed)
    }

    /// Cache reads answered from the store.
    pub fn cache_hits(&self) -> u64 {
        self.inner.cache_hits.load(Ordering::Relaxed)
    }

    /// Cache reads that invoked the fetch function.
    pub fn cache_misses(&self) -> u64 {
        self.inner.cache_misses.load(Ordering::Relaxed)
    }

    /// Cache store operations that failed.
    pub fn cache_errors(&self) -> u64 {
        self.inner.cache_errors.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_admitted: self.requests_admitted(),
            requests_rejected: self.requests_rejected(),
            fallback_decisions: self.fallback_decisions(),
            windows_evicted: self.windows_evicted(),
            cache_hits: self.cache_hits(),
            cache_misses: self.cache_misses(),
            cache_errors: self.cache_errors(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.requests_admitted.store(0, Ordering::Relaxed);
        self.inner.requests_rejected.store(0, Ordering::Relaxed);
        self.inner.fallback_decisions.store(0, Ordering::Relaxed);
        self.inner.windows_evicted.store(0, Ordering::Relaxed);
        self.inner.cache_hits.store(0, Ordering::Relaxed);
        self.inner.cache_misses.store(0, Ordering::Relaxed);
        self.inner.cache_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_admitted: u64,
    pub requests_rejected: u64,
    pub fallback_decisions: u64,
    pub windows_evicted: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
}

impl MetricsSnapshot {
    /// Ratio of rejected requests to total gate decisions (0.0 if none).
    pub fn rejection_rate(&self) -> f64 {
        let total = self.requests_admitted.saturating_add(self.requests_rejected);
        if total == 0 {
            0.0
        } else {
            self.requests_rejected as f64 / total as f64
        }
    }

    /// Ratio of cache hits to total cache reads (0.0 if none).
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits.saturating_add(self.cache_misses);
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Total gate decisions (admitted + rejected).
    pub fn total_decisions(&self) -> u64 {
        self.requests_admitted.saturating_add(self.requests_rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = Metrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_decisions(), 0);
        assert_eq!(snapshot.rejection_rate(), 0.0);
        assert_eq!(snapshot.cache_hit_rate(), 0.0);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        metrics.record_admitted();
        clone.record_admitted();
        clone.record_rejected();

        assert_eq!(metrics.requests_admitted(), 2);
        assert_eq!(metrics.requests_rejected(), 1);
    }

    #[test]
    fn test_rates() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_admitted();
        metrics.record_admitted();
        metrics.record_rejected();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rejection_rate(), 0.25);
        assert_eq!(snapshot.cache_hit_rate(), 0.5);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_cache_error();
        metrics.record_eviction();

        metrics.reset();
        assert_eq!(metrics.snapshot(), Metrics::new().snapshot());
    }
}
