//! Exponential backoff delay schedules.
//!
//! The schedule is pure arithmetic; the retry executor owns the actual
//! suspension between attempts.

use std::cmp;
use std::time::Duration;

/// Capped exponential delay schedule.
///
/// Attempt `i` (0-based) maps to `min(base * 2^i, max)`.
///
/// # Example
/// ```
/// use vox_resilience::domain::backoff::BackoffSchedule;
/// use std::time::Duration;
///
/// let schedule = BackoffSchedule::new(Duration::from_millis(100), Duration::from_secs(1));
/// assert_eq!(schedule.delay_for(0), Duration::from_millis(100));
/// assert_eq!(schedule.delay_for(1), Duration::from_millis(200));
/// assert_eq!(schedule.delay_for(4), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffSchedule {
    base: Duration,
    max: Duration,
}

impl BackoffSchedule {
    /// Create a schedule from a base and a cap.
    ///
    /// A cap below the base is raised to the base, so `delay_for` never
    /// returns less than `base` truncated by `max`.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: cmp::max(base, max),
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = match 1u32.checked_shl(attempt) {
            Some(factor) => factor,
            None => return self.max,
        };
        cmp::min(self.base.saturating_mul(factor), self.max)
    }

    /// The base delay.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// The delay cap.
    pub fn max(&self) -> Duration {
        self.max
    }
}

/// Apply symmetric uniform jitter of `± delay * fraction`.
///
/// `fraction` is clamped to `[0, 1]`, so the result stays within
/// `[delay * (1 - fraction), delay * (1 + fraction)]` and is never negative.
pub fn apply_jitter(delay: Duration, fraction: f64) -> Duration {
    if fraction <= 0.0 || delay.is_zero() {
        return delay;
    }
    let fraction = fraction.min(1.0);

    use rand::Rng;
    let offset: f64 = rand::thread_rng().gen_range(-fraction..=fraction);
    delay.mul_f64(1.0 + offset)
}
