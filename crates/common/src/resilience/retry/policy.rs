//! The per-attempt retry guard.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use super::constants::RETRY_AFTER_HEADER;
use super::decision::RetryDecision;
use super::kinds::{ClassifyFailure, FailureKind};
use super::response::ResponseView;
use super::retry_after::parse_retry_after;

/// Where a guard stands after its attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No outcome processed yet
    Active,
    /// The outcome is final and goes back to the caller
    Accepted,
    /// The outcome was absorbed and another attempt should run
    RetryRequested,
}

/// Rules shared by every guard handed out by one planner
#[derive(Debug, Clone, PartialEq)]
pub struct RetryRules {
    /// Statuses that request a retry on a non-final attempt
    pub status_codes: HashSet<u16>,
    /// Failure kinds absorbed on a non-final attempt
    pub suppressed_failures: HashSet<FailureKind>,
    /// Headers that veto a retry when set to `true`, checked in order
    pub dont_retry_header_names: Vec<String>,
}

/// What the attempt loop should do after an attempt
#[derive(Debug)]
pub enum AttemptOutcome<R, E> {
    /// Stop and hand this result to the caller
    Finished(Result<R, E>),
    /// Wait `backoff` and run the next attempt
    Retry {
        /// Time to wait before the next attempt
        backoff: Duration,
    },
}

/// Guard bound to one attempt.
///
/// A guard starts [`GuardState::Active`] and moves exactly once, either to
/// [`GuardState::Accepted`] or to [`GuardState::RetryRequested`]. A guard for
/// the last attempt never requests a retry.
#[derive(Debug)]
pub struct RetryPolicy<'a> {
    decision: RetryDecision,
    response_backoff: Option<Duration>,
    state: GuardState,
    rules: &'a RetryRules,
}

impl<'a> RetryPolicy<'a> {
    /// Create an active guard for `decision`
    pub const fn new(decision: RetryDecision, rules: &'a RetryRules) -> Self {
        Self { decision, response_backoff: None, state: GuardState::Active, rules }
    }

    /// 1-based attempt index
    pub const fn attempt(&self) -> u32 {
        self.decision.attempt
    }

    /// Whether this guard covers the final attempt
    pub const fn is_last(&self) -> bool {
        self.decision.is_last
    }

    /// Current state
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// Plan this guard was created from
    pub const fn decision(&self) -> RetryDecision {
        self.decision
    }

    /// Backoff before the next attempt: a positive `Retry-After` from the
    /// response if one was seen, the exponential backoff otherwise.
    pub fn backoff(&self) -> Duration {
        self.response_backoff.unwrap_or(self.decision.backoff)
    }

    /// Decide whether a received response is final.
    ///
    /// A don't-retry header set to `true` accepts the response outright. A
    /// retryable status on a non-final attempt requests a retry and picks up
    /// the `Retry-After` backoff. Everything else is accepted.
    pub fn process_response<R: ResponseView + ?Sized>(&mut self, response: &R) -> GuardState {
        if self.state != GuardState::Active {
            return self.state;
        }

        if let Some(name) = self.vetoing_header(response) {
            debug!(attempt = self.attempt(), header = %name, "Retry vetoed by response header");
            self.state = GuardState::Accepted;
            return self.state;
        }

        let status = response.status_code();
        if !self.is_last() && self.rules.status_codes.contains(&status) {
            let retry_after =
                response.header(RETRY_AFTER_HEADER).map(parse_retry_after).unwrap_or_default();
            if !retry_after.is_zero() {
                self.response_backoff = Some(retry_after);
            }
            debug!(
                attempt = self.attempt(),
                status,
                backoff_ms = self.backoff().as_millis() as u64,
                "Retryable response status"
            );
            self.state = GuardState::RetryRequested;
        } else {
            self.state = GuardState::Accepted;
        }
        self.state
    }

    /// Decide whether a failed attempt is absorbed.
    pub fn process_failure<E: ClassifyFailure + ?Sized>(&mut self, failure: &E) -> GuardState {
        if self.state != GuardState::Active {
            return self.state;
        }

        let kind = failure.failure_kind();
        self.state = if !self.is_last() && self.rules.suppressed_failures.contains(&kind) {
            debug!(attempt = self.attempt(), kind = %kind, "Suppressed attempt failure");
            GuardState::RetryRequested
        } else {
            GuardState::Accepted
        };
        self.state
    }

    /// Fold an attempt result into the next step of the attempt loop.
    ///
    /// A retried response is dropped here, which releases anything it holds.
    pub fn conclude<R, E>(mut self, result: Result<R, E>) -> AttemptOutcome<R, E>
    where
        R: ResponseView,
        E: ClassifyFailure,
    {
        let state = match &result {
            Ok(response) => self.process_response(response),
            Err(failure) => self.process_failure(failure),
        };
        match state {
            GuardState::RetryRequested => AttemptOutcome::Retry { backoff: self.backoff() },
            GuardState::Active | GuardState::Accepted => AttemptOutcome::Finished(result),
        }
    }

    fn vetoing_header<R: ResponseView + ?Sized>(&self, response: &R) -> Option<&'a str> {
        self.rules
            .dont_retry_header_names
            .iter()
            .find(|name| {
                response.header(name).is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
            })
            .map(String::as_str)
    }
}
