//! Resilience patterns for HTTP sends
//!
//! - **Retry**: per-attempt guards, exponential backoff and `Retry-After`
//!   handling, see [`retry`]

pub mod retry;

pub use retry::{
    AttemptOutcome, ClassifyFailure, FailureKind, GuardState, ResponseView, Retries,
    RetryDecision, RetryError, RetryManager, RetryManagerBuilder, RetryPolicy, RetryResult,
    RetryRules,
};
