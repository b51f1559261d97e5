//! Application layer - orchestration of the shaping components.
//!
//! This layer coordinates the domain logic:
//! - Retry executor (backoff, classification, exhaustion)
//! - Rate-limit gate (primary counter with fail-secure fallback)
//! - Read-through cache (get-or-populate with explicit invalidation)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from backend details.

pub mod cache;
pub mod gate;
pub mod metrics;
pub mod ports;
pub mod retry;
