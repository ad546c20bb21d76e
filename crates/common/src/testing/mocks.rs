//! Mock responses and failures for exercising retry loops
//!
//! Provides lightweight stand-ins for engine responses and errors, plus a
//! scripted outcome queue that fake transports can pop from.

#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::resilience::retry::{ClassifyFailure, FailureKind, ResponseView};

/// Response with a status and a header list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    /// HTTP status
    pub status: u16,
    /// Headers in insertion order
    pub headers: Vec<(String, String)>,
    /// Body text
    pub body: String,
}

impl MockResponse {
    /// Response with `status` and no headers
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: String::new() }
    }

    /// Append a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

impl ResponseView for MockResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Failure with a fixed kind and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFailure {
    kind: FailureKind,
    message: String,
}

impl MockFailure {
    /// Failure of `kind`
    pub fn new(kind: FailureKind, message: &str) -> Self {
        Self { kind, message: message.to_string() }
    }

    /// Message the failure was created with
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MockFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for MockFailure {}

impl ClassifyFailure for MockFailure {
    fn failure_kind(&self) -> FailureKind {
        self.kind
    }
}

/// Queue of attempt outcomes, popped one per call.
///
/// Once the script runs dry every further call repeats the fallback, so a
/// test can script "N failures then success forever".
#[derive(Debug)]
pub struct AttemptScript<R, E> {
    outcomes: Mutex<VecDeque<Result<R, E>>>,
    fallback: Result<R, E>,
    calls: AtomicUsize,
}

impl<R: Clone, E: Clone> AttemptScript<R, E> {
    /// Script that returns `outcomes` in order, then `fallback`
    pub fn new<I>(outcomes: I, fallback: Result<R, E>) -> Self
    where
        I: IntoIterator<Item = Result<R, E>>,
    {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Pop the next outcome
    pub fn next_outcome(&self) -> Result<R, E> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // A poisoned queue only means another test thread panicked
        let mut outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        outcomes.pop_front().unwrap_or_else(|| self.fallback.clone())
    }

    /// Number of outcomes handed out so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive_and_first_wins() {
        let response =
            MockResponse::new(200).with_header("X-Token", "one").with_header("x-token", "two");

        assert_eq!(response.header("x-TOKEN"), Some("one"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn script_falls_back_after_running_dry() {
        let script: AttemptScript<MockResponse, MockFailure> = AttemptScript::new(
            [Err(MockFailure::new(FailureKind::Connect, "refused"))],
            Ok(MockResponse::new(204)),
        );

        assert!(script.next_outcome().is_err());
        assert_eq!(script.next_outcome().map(|r| r.status), Ok(204));
        assert_eq!(script.next_outcome().map(|r| r.status), Ok(204));
        assert_eq!(script.calls(), 3);
    }
}
