//! Retry executor with capped exponential backoff and jitter.
//!
//! Wraps a fallible asynchronous operation, classifies each failure as
//! transient or fatal, and re-invokes transient failures after a jittered
//! backoff delay. Fatal failures propagate immediately without consuming a
//! retry; exhausted retries surface as a distinguished error carrying the
//! attempt count.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::application::ports::Sleeper;
use crate::domain::backoff::{apply_jitter, BackoffSchedule};
use crate::domain::classify::is_transient;
use crate::infrastructure::sleeper::TokioSleeper;

/// Terminal outcome of a failed retry loop.
///
/// `Exhausted` means every permitted attempt failed with a transient error;
/// `Fatal` means the first non-retryable failure was propagated as-is.
/// Handlers map `Exhausted` to a server error and can distinguish it from a
/// first-attempt fatal failure for observability.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt failed with a transient error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// The failure of the final attempt.
        #[source]
        last: E,
    },

    /// A non-retryable failure, propagated on first occurrence.
    #[error(transparent)]
    Fatal(#[from] E),
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Total attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Fatal(_) => 1,
        }
    }

    /// Whether retries were exhausted (as opposed to a fatal failure).
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// The underlying failure.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Fatal(err) => err,
        }
    }
}

/// Retry policy: attempt budget, backoff shape, and failure classifier.
///
/// Immutable and reentrant; one policy can serve unbounded concurrent
/// `execute` calls. Constructed per call site, typically once at startup.
///
/// # Example
/// ```no_run
/// use vox_resilience::RetryPolicy;
/// use vox_resilience::domain::classify::UpstreamStatus;
/// use std::time::Duration;
///
/// # async fn demo() {
/// let policy = RetryPolicy::<UpstreamStatus>::new()
///     .with_max_retries(2)
///     .with_base_delay(Duration::from_secs(1));
///
/// let reply = policy
///     .execute(|| async { Err::<String, _>(UpstreamStatus(503)) })
///     .await;
/// assert!(reply.is_err());
/// # }
/// ```
pub struct RetryPolicy<E> {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_fraction: f64,
    classify: Arc<dyn Fn(&E, u32) -> bool + Send + Sync>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            jitter_fraction: self.jitter_fraction,
            classify: Arc::clone(&self.classify),
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter_fraction", &self.jitter_fraction)
            .finish_non_exhaustive()
    }
}

impl<E> RetryPolicy<E>
where
    E: std::error::Error + 'static,
{
    /// Default policy: 3 retries, 1 s base delay, 10 s cap, 10% jitter,
    /// default transient classification.
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter_fraction: 0.1,
            classify: Arc::new(|err: &E, _attempt: u32| is_transient(err)),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Maximum retries after the initial attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before the first retry.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Cap on the computed delay.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Symmetric jitter fraction, clamped to `[0, 1]`.
    pub fn with_jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Replace the failure classifier. The closure receives the failure and
    /// the 0-based attempt index; returning `false` makes the failure fatal.
    pub fn with_classifier(
        mut self,
        classify: impl Fn(&E, u32) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.classify = Arc::new(classify);
        self
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run `operation` with up to `max_retries + 1` attempts.
    ///
    /// A failure classified fatal is returned immediately as
    /// [`RetryError::Fatal`]; a transient failure on the final attempt is
    /// returned as [`RetryError::Exhausted`]. The delay before retry `i`
    /// is `min(base * 2^i, max)` with symmetric jitter applied.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let schedule = BackoffSchedule::new(self.base_delay, self.max_delay);
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts = attempt + 1, "operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if !(self.classify)(&err, attempt) {
                        debug!(error = %err, "non-retryable failure");
                        return Err(RetryError::Fatal(err));
                    }
                    if attempt >= self.max_retries {
                        warn!(attempts = attempt + 1, error = %err, "retries exhausted");
                        return Err(RetryError::Exhausted {
                            attempts: attempt + 1,
                            last: err,
                        });
                    }

                    let delay = apply_jitter(schedule.delay_for(attempt), self.jitter_fraction);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl<E> Default for RetryPolicy<E>
where
    E: std::error::Error + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
