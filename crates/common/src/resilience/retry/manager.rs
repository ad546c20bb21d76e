//! Attempt planning: how many attempts a method gets and how long to wait
//! between them.

use std::collections::HashSet;
use std::iter::FusedIterator;
use std::time::Duration;

use super::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BACKOFF_MAX, DEFAULT_DONT_RETRY_HEADER, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_METHODS, DEFAULT_STATUS_CODES, DEFAULT_SUPPRESSED_FAILURES,
};
use super::decision::RetryDecision;
use super::error::{RetryError, RetryResult};
use super::kinds::FailureKind;
use super::policy::{RetryPolicy, RetryRules};

// 2^62 * any sane factor already exceeds every reasonable backoff_max
const MAX_EXPONENT: u32 = 62;

/// Produces the attempt sequence for a logical send.
///
/// Immutable once built; each call to [`retries`](Self::retries) returns a
/// fresh single-pass sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryManager {
    max_attempts: u32,
    backoff_factor: f64,
    backoff_max: Duration,
    allowed_methods: HashSet<String>,
    rules: RetryRules,
}

impl Default for RetryManager {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            backoff_max: DEFAULT_BACKOFF_MAX,
            allowed_methods: DEFAULT_METHODS.iter().map(|m| (*m).to_string()).collect(),
            rules: RetryRules {
                status_codes: DEFAULT_STATUS_CODES.into_iter().collect(),
                suppressed_failures: DEFAULT_SUPPRESSED_FAILURES.into_iter().collect(),
                dont_retry_header_names: vec![DEFAULT_DONT_RETRY_HEADER.to_string()],
            },
        }
    }
}

impl RetryManager {
    /// Start configuring a planner from the defaults
    pub fn builder() -> RetryManagerBuilder {
        RetryManagerBuilder::new()
    }

    /// Configured attempt ceiling
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Methods that get more than one attempt
    pub const fn allowed_methods(&self) -> &HashSet<String> {
        &self.allowed_methods
    }

    /// Rules every guard applies
    pub const fn rules(&self) -> &RetryRules {
        &self.rules
    }

    /// Number of attempts `method` gets. The match is case-sensitive.
    pub fn attempts_for(&self, method: &str) -> u32 {
        if self.allowed_methods.contains(method) {
            self.max_attempts
        } else {
            1
        }
    }

    /// Exponential backoff for 1-based `attempt`:
    /// `min(backoff_max, backoff_factor * 2^(attempt - 1))`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT);
        let seconds = self.backoff_factor * 2f64.powi(exponent as i32);
        if seconds >= self.backoff_max.as_secs_f64() {
            return self.backoff_max;
        }
        Duration::try_from_secs_f64(seconds).unwrap_or(self.backoff_max)
    }

    /// Fresh attempt sequence for `method`
    pub fn retries(&self, method: &str) -> Retries<'_> {
        Retries { manager: self, issued: 0, total: self.attempts_for(method) }
    }
}

/// Lazy, finite, single-pass sequence of guards, one per attempt.
#[derive(Debug)]
pub struct Retries<'a> {
    manager: &'a RetryManager,
    /// Guards handed out so far, never above `total`
    issued: u32,
    total: u32,
}

impl Retries<'_> {
    /// Attempts the sequence was planned with
    pub const fn total(&self) -> u32 {
        self.total
    }
}

impl<'a> Iterator for Retries<'a> {
    type Item = RetryPolicy<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.issued >= self.total {
            return None;
        }
        let attempt = self.issued + 1;
        self.issued = attempt;

        let decision = RetryDecision::new(
            attempt,
            attempt == self.total,
            self.manager.backoff_for(attempt),
        );
        Some(RetryPolicy::new(decision, &self.manager.rules))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.total - self.issued).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Retries<'_> {}

impl FusedIterator for Retries<'_> {}

/// Builder for [`RetryManager`]
#[derive(Debug, Clone)]
pub struct RetryManagerBuilder {
    inner: RetryManager,
}

impl Default for RetryManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryManagerBuilder {
    /// Builder seeded with the defaults
    pub fn new() -> Self {
        Self { inner: RetryManager::default() }
    }

    /// Attempts per logical send, first one included
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.inner.max_attempts = max_attempts;
        self
    }

    /// Base of the exponential backoff, in seconds
    #[must_use]
    pub fn backoff_factor(mut self, seconds: f64) -> Self {
        self.inner.backoff_factor = seconds;
        self
    }

    /// Ceiling of the exponential backoff
    #[must_use]
    pub const fn backoff_max(mut self, backoff_max: Duration) -> Self {
        self.inner.backoff_max = backoff_max;
        self
    }

    /// Replace the retryable methods
    #[must_use]
    pub fn allowed_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.allowed_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Add one retryable method, e.g. `POST`
    #[must_use]
    pub fn allow_method<S: Into<String>>(mut self, method: S) -> Self {
        self.inner.allowed_methods.insert(method.into());
        self
    }

    /// Replace the retryable statuses. An empty set disables status retries.
    #[must_use]
    pub fn status_codes<I: IntoIterator<Item = u16>>(mut self, codes: I) -> Self {
        self.inner.rules.status_codes = codes.into_iter().collect();
        self
    }

    /// Replace the suppressed failure kinds
    #[must_use]
    pub fn suppressed_failures<I: IntoIterator<Item = FailureKind>>(mut self, kinds: I) -> Self {
        self.inner.rules.suppressed_failures = kinds.into_iter().collect();
        self
    }

    /// Replace the don't-retry header names. Order is preserved.
    #[must_use]
    pub fn dont_retry_header_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.rules.dont_retry_header_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and build
    pub fn build(self) -> RetryResult<RetryManager> {
        self.validate()?;
        Ok(self.inner)
    }

    fn validate(&self) -> RetryResult<()> {
        if self.inner.max_attempts == 0 {
            return Err(RetryError::invalid("max_attempts must be at least 1"));
        }
        if !self.inner.backoff_factor.is_finite() || self.inner.backoff_factor < 0.0 {
            return Err(RetryError::invalid(format!(
                "backoff_factor must be a finite, non-negative number of seconds, got {}",
                self.inner.backoff_factor
            )));
        }
        if self.inner.rules.dont_retry_header_names.iter().any(|name| name.trim().is_empty()) {
            return Err(RetryError::invalid("dont_retry_header_names must not contain blanks"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for attempt planning
    //!
    //! Tests cover the exponential schedule, the method allow-list, sequence
    //! length and the last-attempt flag, and builder validation.

    use super::*;
    use crate::resilience::retry::GuardState;
    use crate::testing::MockResponse;

    fn manager(max_attempts: u32, factor: f64) -> RetryManager {
        RetryManager::builder()
            .max_attempts(max_attempts)
            .backoff_factor(factor)
            .build()
            .expect("valid configuration")
    }

    fn assert_close(actual: Duration, expected_secs: f64) {
        let diff = (actual.as_secs_f64() - expected_secs).abs();
        assert!(diff < 1e-6, "expected {expected_secs}s, got {actual:?}");
    }

    /// Validates the exponential schedule for factor 0.01.
    ///
    /// Assertions:
    /// - Attempts 1 to 5 back off 0.01, 0.02, 0.04, 0.08 and 0.16 seconds.
    #[test]
    fn exponential_schedule() {
        let manager = manager(5, 0.01);
        let backoffs: Vec<_> = manager.retries("GET").map(|guard| guard.backoff()).collect();

        assert_eq!(backoffs.len(), 5);
        for (actual, expected) in backoffs.into_iter().zip([0.01, 0.02, 0.04, 0.08, 0.16]) {
            assert_close(actual, expected);
        }
    }

    #[test]
    fn backoff_is_capped() {
        let manager = RetryManager::builder()
            .backoff_factor(1.0)
            .backoff_max(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(manager.backoff_for(3), Duration::from_secs(4));
        assert_eq!(manager.backoff_for(4), Duration::from_secs(5));
        assert_eq!(manager.backoff_for(200), Duration::from_secs(5));
    }

    #[test]
    fn zero_factor_never_waits() {
        let manager = manager(3, 0.0);
        assert!(manager.retries("GET").all(|guard| guard.backoff().is_zero()));
    }

    /// Validates sequence length per method.
    ///
    /// Assertions:
    /// - Allowed methods get `max_attempts` guards.
    /// - POST and lower-case verbs get a single guard.
    #[test]
    fn sequence_length_follows_allow_list() {
        let manager = manager(4, 0.1);

        for method in DEFAULT_METHODS {
            assert_eq!(manager.retries(method).len(), 4, "{method}");
        }
        assert_eq!(manager.retries("POST").len(), 1);
        assert_eq!(manager.retries("PATCH").len(), 1);
        assert_eq!(manager.retries("get").len(), 1);
    }

    #[test]
    fn post_can_be_allowed() {
        let manager = RetryManager::builder().max_attempts(3).allow_method("POST").build().unwrap();

        assert_eq!(manager.retries("POST").count(), 3);
        assert_eq!(manager.retries("GET").count(), 3);
    }

    #[test]
    fn only_final_guard_is_last() {
        let manager = manager(3, 0.1);
        let flags: Vec<_> = manager.retries("PUT").map(|guard| guard.is_last()).collect();

        assert_eq!(flags, vec![false, false, true]);
        assert!(manager.retries("POST").all(|guard| guard.is_last()));
    }

    #[test]
    fn attempts_are_one_based() {
        let manager = manager(3, 0.1);
        let attempts: Vec<_> = manager.retries("GET").map(|guard| guard.attempt()).collect();

        assert_eq!(attempts, vec![1, 2, 3]);
    }

    #[test]
    fn sequence_is_single_pass_and_fused() {
        let manager = manager(2, 0.1);
        let mut retries = manager.retries("GET");

        assert_eq!(retries.total(), 2);
        assert!(retries.next().is_some());
        assert_eq!(retries.len(), 1);
        assert!(retries.next().is_some());
        assert!(retries.next().is_none());
        assert!(retries.next().is_none());

        // A fresh call plans again from the first attempt
        assert_eq!(manager.retries("GET").len(), 2);
    }

    #[test]
    fn final_guard_accepts_retryable_status() {
        let manager = manager(2, 0.1);
        let states: Vec<_> = manager
            .retries("GET")
            .map(|mut guard| guard.process_response(&MockResponse::new(503)))
            .collect();

        assert_eq!(states, vec![GuardState::RetryRequested, GuardState::Accepted]);
    }

    #[test]
    fn custom_status_codes() {
        let manager = RetryManager::builder().status_codes([500]).build().unwrap();
        let mut guard = manager.retries("GET").next().unwrap();

        assert_eq!(guard.process_response(&MockResponse::new(500)), GuardState::RetryRequested);
        assert!(!manager.rules().status_codes.contains(&503));
    }

    #[test]
    fn max_attempts_at_type_limit_does_not_overflow() {
        let manager = manager(u32::MAX, 0.0);
        let mut retries = manager.retries("GET");

        assert_eq!(retries.len(), u32::MAX as usize);
        let first = retries.next().expect("first guard");
        assert_eq!(first.attempt(), 1);
        assert!(!first.is_last());
        assert_eq!(retries.len(), u32::MAX as usize - 1);

        // skip to the final guard without walking the whole sequence
        retries.issued = u32::MAX - 1;
        let last = retries.next().expect("final guard");
        assert_eq!(last.attempt(), u32::MAX);
        assert!(last.is_last());
        assert_eq!(retries.len(), 0);
        assert!(retries.next().is_none());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let err = RetryManager::builder().max_attempts(0).build().unwrap_err();
        assert!(matches!(err, RetryError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn bad_backoff_factor_is_rejected() {
        for factor in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(RetryManager::builder().backoff_factor(factor).build().is_err());
        }
    }

    #[test]
    fn blank_dont_retry_header_is_rejected() {
        let result = RetryManager::builder().dont_retry_header_names([" "]).build();
        assert!(result.is_err());
    }

    #[test]
    fn defaults() {
        let manager = RetryManager::default();

        assert_eq!(manager.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(manager.rules().status_codes.len(), 3);
        assert!(manager.rules().suppressed_failures.contains(&FailureKind::Connect));
        assert!(manager.rules().suppressed_failures.contains(&FailureKind::ConnectTimeout));
        assert!(!manager.allowed_methods().contains("POST"));
        assert_eq!(manager.rules().dont_retry_header_names, vec!["Dont-Retry".to_string()]);
    }
}
