//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of application logic.

pub mod clock;
pub mod counter;
pub mod sleeper;
pub mod store;

pub use clock::MockClock;
pub use counter::{FailingCounter, InMemoryCounter};
pub use sleeper::MockSleeper;
pub use store::{FailingStore, InMemoryStore};
