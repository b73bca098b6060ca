//! # CampusHub Testing
//!
//! Testing utilities and helpers for the CampusHub architecture.
//!
//! This crate provides:
//! - [`ReducerTest`]: fluent Given-When-Then harness for reducer tests
//! - [`mocks::InMemoryEventStore`]: deterministic event store with
//!   version-checked appends
//! - [`mocks::InMemoryEventBus`]: broadcast-based event bus with a published
//!   log for assertions
//! - [`mocks::FixedClock`]: deterministic time
//!
//! ## Example
//!
//! ```ignore
//! use campushub_testing::{ReducerTest, mocks::test_clock};
//!
//! ReducerTest::new(LedgerReducer::new())
//!     .with_env(LedgerEnvironment::new(Arc::new(test_clock())))
//!     .given_state(state_with_open_book())
//!     .when_action(LedgerAction::Register { /* ... */ })
//!     .then_state(|state| assert!(state.last_error.is_none()))
//!     .run();
//! ```

pub mod mocks;
mod reducer_test;

pub use mocks::{FixedClock, InMemoryEventBus, InMemoryEventStore, test_clock};
pub use reducer_test::{ReducerTest, assertions};
