//! Foundation utilities shared across Courier crates.
//!
//! # Modules
//!
//! - [`resilience`]: the retry state machine that turns one logical send into
//!   a bounded sequence of attempts
//! - [`testing`]: mocks for retry loops (feature `test-utils`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use resilience::retry::{
    AttemptOutcome, ClassifyFailure, FailureKind, GuardState, ResponseView, RetryDecision,
    RetryError, RetryManager, RetryPolicy,
};
