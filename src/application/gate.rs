//! Rate-limit gate: admit/reject decisions with standard headers.
//!
//! The gate consults the distributed sliding-window counter first and falls
//! back to the in-process fixed-window limiter when the counter is
//! unconfigured or unreachable. The fallback is fail-secure: limiting keeps
//! happening, just with process-local precision.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, RateCounter, WindowUsage};
use crate::domain::bucket::Bucket;
use crate::domain::identity::CallerIdentity;
use crate::infrastructure::fallback::FallbackLimiter;

/// Machine-readable code carried by every rejection body.
pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";

/// HTTP status a rejection maps to.
pub const REJECTION_STATUS: u16 = 429;

/// Outcome of one rate-limit check.
///
/// Rejection is a value, not an error: handlers check `admitted` and
/// short-circuit with [`RateLimitDecision::rejection`] when it is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub admitted: bool,
    /// The bucket's limit.
    pub limit: u64,
    /// Admissions left in the current window.
    pub remaining: u64,
    /// Epoch milliseconds at which the window resets.
    pub reset_ms: u64,
    /// Seconds until the window resets; present only on rejection.
    pub retry_after_secs: Option<u64>,
}

impl RateLimitDecision {
    /// Standard rate-limit headers for this decision.
    ///
    /// `X-RateLimit-Reset` is rendered in epoch seconds; `Retry-After` is
    /// appended only on rejection.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_ms.div_ceil(1000).to_string()),
        ];
        if let Some(secs) = self.retry_after_secs {
            headers.push(("Retry-After", secs.to_string()));
        }
        headers
    }

    /// The JSON body for a rejected request, or `None` if admitted.
    pub fn rejection(&self) -> Option<RateLimitRejection> {
        if self.admitted {
            return None;
        }
        let retry_after = self.retry_after_secs.unwrap_or(0);
        Some(RateLimitRejection {
            error: format!("Rate limit exceeded. Try again in {retry_after}s."),
            code: RATE_LIMIT_EXCEEDED,
            limit: self.limit,
            remaining: 0,
            retry_after,
        })
    }
}

/// Body of an HTTP 429 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRejection {
    pub error: String,
    pub code: &'static str,
    pub limit: u64,
    pub remaining: u64,
    pub retry_after: u64,
}

/// Admit/reject gate over a distributed counter with a fail-secure fallback.
///
/// Constructed once at startup (see `ResilienceStack`) and shared by
/// reference across handlers.
#[derive(Debug)]
pub struct RateLimitGate {
    primary: Option<Arc<dyn RateCounter>>,
    fallback: FallbackLimiter,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl RateLimitGate {
    /// Create a gate over an optional distributed counter.
    ///
    /// With `primary` as `None` every decision is served by `fallback`.
    pub fn new(
        primary: Option<Arc<dyn RateCounter>>,
        fallback: FallbackLimiter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            primary,
            fallback,
            clock,
            metrics: Metrics::new(),
        }
    }

    /// Share a metrics handle with other components.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Decide whether one request from `identity` may pass through `bucket`.
    ///
    /// Counter failures are logged and absorbed; the decision then comes
    /// from the in-process fallback so limiting never switches off.
    pub async fn check(&self, bucket: &Bucket, identity: &CallerIdentity) -> RateLimitDecision {
        let now_ms = self.clock.now_ms();
        let key = bucket.key_for(identity);
        let window_ms = bucket.window_ms();

        let usage = match &self.primary {
            Some(counter) => match counter.record(&key, now_ms, window_ms).await {
                Ok(usage) => usage,
                Err(error) => {
                    warn!(
                        %error,
                        bucket = bucket.name(),
                        "rate counter unavailable, enforcing in-process fallback"
                    );
                    self.metrics.record_fallback();
                    self.fallback.record(&key, now_ms, window_ms)
                }
            },
            None => {
                self.metrics.record_fallback();
                self.fallback.record(&key, now_ms, window_ms)
            }
        };

        let decision = decide(bucket, usage, now_ms);
        if decision.admitted {
            self.metrics.record_admitted();
        } else {
            self.metrics.record_rejected();
        }
        decision
    }

    /// Metrics collected by this gate.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

fn decide(bucket: &Bucket, usage: WindowUsage, now_ms: u64) -> RateLimitDecision {
    let limit = u64::from(bucket.limit());
    let admitted = usage.count <= limit;
    let retry_after_secs = if admitted {
        None
    } else {
        Some(usage.reset_ms.saturating_sub(now_ms).div_ceil(1000))
    };

    RateLimitDecision {
        admitted,
        limit,
        remaining: limit.saturating_sub(usage.count),
        reset_ms: usage.reset_ms,
        retry_after_secs,
    }
}
