//! Mock clock for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::Clock;

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling
/// deterministic testing of windows and TTLs.
///
/// # Examples
///
/// ```
/// use vox_resilience::infrastructure::mocks::MockClock;
/// use vox_resilience::application::ports::Clock;
/// use std::time::Duration;
///
/// let clock = MockClock::new(1_000);
/// assert_eq!(clock.now_ms(), 1_000);
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now_ms(), 11_000);
/// ```
///
/// # Thread Safety
///
/// `MockClock` is thread-safe and can be cloned to share across tasks.
/// All clones share the same underlying time value.
#[derive(Debug, Clone)]
pub struct MockClock {
    now_ms: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a mock clock starting at the given epoch milliseconds.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        self.advance_ms(duration.as_millis() as u64);
    }

    /// Advance the clock by milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the clock to a specific epoch millisecond value.
    pub fn set_ms(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock() {
        let clock = MockClock::new(500);
        assert_eq!(clock.now_ms(), 500);

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_ms(), 1_500);

        clock.set_ms(42);
        assert_eq!(clock.now_ms(), 42);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = MockClock::new(0);
        let clone = clock.clone();

        clone.advance_ms(100);
        assert_eq!(clock.now_ms(), 100);
    }
}
