//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock and sleeper abstractions (system time, tokio sleep, mocks)
//! - The in-process fallback limiter
//! - Redis-backed counter and cache store
//! - Startup configuration and wiring

pub mod clock;
pub mod config;
pub mod fallback;
pub mod sleeper;

#[cfg(feature = "redis-backend")]
pub mod redis_cache;
#[cfg(feature = "redis-backend")]
pub mod redis_counter;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for testing
/// shaping behavior.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// vox-resilience = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
