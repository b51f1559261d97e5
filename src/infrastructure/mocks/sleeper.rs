//! Mock sleeper for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::Sleeper;

/// Sleeper that records requested delays and returns immediately.
///
/// Lets retry tests assert the exact backoff schedule without waiting.
#[derive(Debug, Clone, Default)]
pub struct MockSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl MockSleeper {
    /// Create a mock sleeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// All delays requested so far, in order.
    pub fn slept(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .expect("MockSleeper mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }

    /// Sum of all delays requested so far.
    pub fn total_slept(&self) -> Duration {
        self.slept().iter().sum()
    }
}

#[async_trait]
impl Sleeper for MockSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .expect("MockSleeper mutex poisoned - a test thread panicked while holding the lock")
            .push(duration);
    }
}
