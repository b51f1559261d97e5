//! Transient-vs-fatal failure classification.
//!
//! The retry executor consults this module when the call site supplies no
//! classifier of its own. Classification walks the full `source()` chain of
//! an error: structured causes first (I/O error kinds, embedded HTTP
//! statuses), then a loose message heuristic as a last resort.

use std::error::Error;
use std::io;

use thiserror::Error as ThisError;

/// HTTP statuses worth retrying: request timeout, too many requests, and the
/// transient 5xx family.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Message fragments treated as transient when no structured cause matched.
///
/// Deliberately loose; call sites that can should embed an [`UpstreamStatus`]
/// or `std::io::Error` in their error chain instead of relying on this.
const TRANSIENT_MARKERS: [&str; 4] = ["timeout", "timed out", "connection reset", "dns error"];

/// An HTTP status returned by an upstream provider, carried inside an error
/// chain so the default classifier can see it.
///
/// # Example
/// ```
/// use vox_resilience::domain::classify::{is_transient, UpstreamStatus};
///
/// assert!(is_transient(&UpstreamStatus(503)));
/// assert!(!is_transient(&UpstreamStatus(401)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[error("upstream returned HTTP {0}")]
pub struct UpstreamStatus(pub u16);

/// Whether an HTTP status code is worth retrying.
pub fn retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Whether an I/O error kind signals a transient network condition.
pub fn retryable_io_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::TimedOut
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
    )
}

/// Classify an error as transient (retryable) or fatal.
///
/// Walks the `source()` chain; any node that is a transient I/O error, a
/// retryable [`UpstreamStatus`], or whose message contains a transient marker
/// makes the whole error transient. Everything else is fatal.
pub fn is_transient(err: &(dyn Error + 'static)) -> bool {
    let mut node: Option<&(dyn Error + 'static)> = Some(err);
    while let Some(e) = node {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if retryable_io_kind(io_err.kind()) {
                return true;
            }
        }
        if let Some(UpstreamStatus(status)) = e.downcast_ref::<UpstreamStatus>() {
            if retryable_status(*status) {
                return true;
            }
        }
        let message = e.to_string().to_ascii_lowercase();
        if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
            return true;
        }
        node = e.source();
    }
    false
}
