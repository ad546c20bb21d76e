//! Per-attempt retry planning for HTTP sends.
//!
//! A logical send is executed as a bounded sequence of physical attempts. The
//! [`RetryManager`] hands out one [`RetryPolicy`] guard per attempt; each guard
//! inspects the outcome of its attempt (a response or a classified failure)
//! and settles into one of the [`GuardState`]s:
//!
//! ```text
//!            process_response / process_failure
//!  ACTIVE ───────────────────────────────────────► ACCEPTED
//!    │                                                ▲
//!    │ retryable status or suppressed failure         │ is_last
//!    └──────────────► RETRY_REQUESTED ────────────────┘
//! ```
//!
//! The attempt loop never sees the retry condition itself: it asks the guard
//! to [`conclude`](RetryPolicy::conclude) the attempt and either gets the
//! final result back or a backoff to wait before the next guard.
//!
//! The same planner drives the blocking and the cooperative sessions; only
//! the way they wait differs.

mod constants;
mod decision;
mod error;
mod kinds;
mod manager;
mod policy;
mod response;
mod retry_after;

pub use constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKOFF_MAX, DEFAULT_DONT_RETRY_HEADER, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_METHODS, DEFAULT_STATUS_CODES, DEFAULT_SUPPRESSED_FAILURES, RETRY_AFTER_HEADER,
};
pub use decision::RetryDecision;
pub use error::{RetryError, RetryResult};
pub use kinds::{ClassifyFailure, FailureKind};
pub use manager::{Retries, RetryManager, RetryManagerBuilder};
pub use policy::{AttemptOutcome, GuardState, RetryPolicy, RetryRules};
pub use response::ResponseView;
pub use retry_after::{parse_retry_after, parse_retry_after_at};
