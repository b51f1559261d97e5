//! Sleeper adapter for production use.

use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::Sleeper;

/// Suspends via `tokio::time::sleep`, cooperatively yielding to other tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
