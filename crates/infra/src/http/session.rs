//! Retrying session
//!
//! Owns an engine and a [`RetryManager`]. Every logical send walks a fresh
//! attempt sequence; each attempt is folded through its guard, and only the
//! final outcome leaves the session.

use std::future::Future;
use std::time::Duration;

use courier_common::resilience::retry::{AttemptOutcome, ClassifyFailure, ResponseView};
use courier_common::{FailureKind, RetryManager};
use courier_domain::Cause;
use tracing::{debug, warn};

use super::engine::{AsyncHttpEngine, HttpEngine, WireRequest};

const EXHAUSTED: &str = "retry sequence ended without an outcome";

/// Blocking session
#[derive(Debug)]
pub struct Session<E> {
    engine: E,
    retries: RetryManager,
}

impl<E: HttpEngine> Session<E> {
    pub const fn new(engine: E, retries: RetryManager) -> Self {
        Self { engine, retries }
    }

    pub const fn retries(&self) -> &RetryManager {
        &self.retries
    }

    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Send with retries, buffering each response
    ///
    /// # Errors
    /// Returns the failure of the final attempt.
    pub fn send(&self, request: &WireRequest) -> Result<E::Response, Cause> {
        self.run(request, |request| self.engine.perform(request))
    }

    /// Send with retries, streaming the accepted response
    ///
    /// # Errors
    /// Returns the failure of the final attempt.
    pub fn stream(&self, request: &WireRequest) -> Result<E::Stream, Cause> {
        self.run(request, |request| self.engine.perform_streaming(request))
    }

    fn run<R, F>(&self, request: &WireRequest, mut attempt: F) -> Result<R, Cause>
    where
        R: ResponseView,
        F: FnMut(&WireRequest) -> Result<R, Cause>,
    {
        for guard in self.retries.retries(request.method.as_str()) {
            let number = guard.attempt();
            match guard.conclude(attempt(request)) {
                AttemptOutcome::Finished(result) => return finish(number, request, result),
                AttemptOutcome::Retry { backoff } => {
                    log_retry(number, request, backoff);
                    std::thread::sleep(backoff);
                }
            }
        }
        Err(Cause::new(FailureKind::Other, EXHAUSTED))
    }
}

/// Cooperative session
#[derive(Debug)]
pub struct AsyncSession<E> {
    engine: E,
    retries: RetryManager,
}

impl<E: AsyncHttpEngine> AsyncSession<E> {
    pub const fn new(engine: E, retries: RetryManager) -> Self {
        Self { engine, retries }
    }

    pub const fn retries(&self) -> &RetryManager {
        &self.retries
    }

    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// # Errors
    /// Returns the failure of the final attempt.
    pub async fn send(&self, request: &WireRequest) -> Result<E::Response, Cause> {
        self.run(request, || self.engine.perform(request)).await
    }

    /// # Errors
    /// Returns the failure of the final attempt.
    pub async fn stream(&self, request: &WireRequest) -> Result<E::Stream, Cause> {
        self.run(request, || self.engine.perform_streaming(request)).await
    }

    async fn run<R, F, Fut>(&self, request: &WireRequest, mut attempt: F) -> Result<R, Cause>
    where
        R: ResponseView,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, Cause>>,
    {
        for guard in self.retries.retries(request.method.as_str()) {
            let number = guard.attempt();
            let result = attempt().await;
            match guard.conclude(result) {
                AttemptOutcome::Finished(result) => return finish(number, request, result),
                AttemptOutcome::Retry { backoff } => {
                    log_retry(number, request, backoff);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
        Err(Cause::new(FailureKind::Other, EXHAUSTED))
    }
}

fn finish<R>(attempt: u32, request: &WireRequest, result: Result<R, Cause>) -> Result<R, Cause> {
    if let Err(cause) = &result {
        warn!(
            attempt,
            method = %request.method,
            url = %request.url,
            kind = %cause.failure_kind(),
            "Request failed: {cause}"
        );
    }
    result
}

fn log_retry(attempt: u32, request: &WireRequest, backoff: Duration) {
    debug!(
        attempt,
        method = %request.method,
        url = %request.url,
        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
        "Retrying request"
    );
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use async_trait::async_trait;
    use courier_common::testing::{AttemptScript, MockResponse};
    use courier_domain::HttpMethod;

    use super::*;
    use crate::http::engine::WireBody;

    struct ScriptedEngine {
        script: AttemptScript<MockResponse, FailureKind>,
    }

    impl ScriptedEngine {
        fn new<I>(outcomes: I, fallback: Result<MockResponse, FailureKind>) -> Self
        where
            I: IntoIterator<Item = Result<MockResponse, FailureKind>>,
        {
            Self { script: AttemptScript::new(outcomes, fallback) }
        }

        fn attempt(&self) -> Result<MockResponse, Cause> {
            self.script.next_outcome().map_err(|kind| Cause::new(kind, "scripted failure"))
        }

        fn calls(&self) -> usize {
            self.script.calls()
        }
    }

    impl HttpEngine for ScriptedEngine {
        type Response = MockResponse;
        type Stream = MockResponse;

        fn perform(&self, _request: &WireRequest) -> Result<MockResponse, Cause> {
            self.attempt()
        }

        fn perform_streaming(&self, _request: &WireRequest) -> Result<MockResponse, Cause> {
            self.attempt()
        }
    }

    #[async_trait]
    impl AsyncHttpEngine for ScriptedEngine {
        type Response = MockResponse;
        type Stream = MockResponse;

        async fn perform(&self, _request: &WireRequest) -> Result<MockResponse, Cause> {
            self.attempt()
        }

        async fn perform_streaming(&self, _request: &WireRequest) -> Result<MockResponse, Cause> {
            self.attempt()
        }
    }

    fn request(method: HttpMethod) -> WireRequest {
        WireRequest {
            method,
            url: "http://service.test/items".to_string(),
            headers: Vec::new(),
            body: WireBody::Empty,
        }
    }

    fn manager(max_attempts: u32) -> RetryManager {
        RetryManager::builder()
            .max_attempts(max_attempts)
            .backoff_factor(0.001)
            .backoff_max(Duration::from_millis(5))
            .build()
            .unwrap()
    }

    #[test]
    fn retries_retryable_status_until_success() {
        let engine = ScriptedEngine::new(
            vec![Ok(MockResponse::new(503)), Ok(MockResponse::new(503))],
            Ok(MockResponse::new(200)),
        );
        let session = Session::new(engine, manager(3));

        let response = session.send(&request(HttpMethod::Get)).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(session.engine().calls(), 3);
    }

    #[test]
    fn last_retryable_status_is_returned_as_is() {
        let engine = ScriptedEngine::new(Vec::new(), Ok(MockResponse::new(503)));
        let session = Session::new(engine, manager(4));

        let response = session.stream(&request(HttpMethod::Get)).unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(session.engine().calls(), 4);
    }

    #[test]
    fn suppressed_failure_propagates_after_last_attempt() {
        let engine = ScriptedEngine::new(Vec::new(), Err(FailureKind::Connect));
        let session = Session::new(engine, manager(3));

        let cause = session.send(&request(HttpMethod::Get)).unwrap_err();

        assert_eq!(cause.kind(), FailureKind::Connect);
        assert_eq!(session.engine().calls(), 3);
    }

    #[test]
    fn unsuppressed_failure_stops_immediately() {
        let engine = ScriptedEngine::new(Vec::new(), Err(FailureKind::ReadTimeout));
        let session = Session::new(engine, manager(5));

        let cause = session.send(&request(HttpMethod::Get)).unwrap_err();

        assert_eq!(cause.kind(), FailureKind::ReadTimeout);
        assert_eq!(session.engine().calls(), 1);
    }

    #[test]
    fn post_gets_a_single_attempt() {
        let engine = ScriptedEngine::new(Vec::new(), Ok(MockResponse::new(503)));
        let session = Session::new(engine, manager(5));

        let response = session.send(&request(HttpMethod::Post)).unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(session.engine().calls(), 1);
    }

    #[test]
    fn dont_retry_header_accepts_response() {
        let engine = ScriptedEngine::new(
            Vec::new(),
            Ok(MockResponse::new(503).with_header("Dont-Retry", "true")),
        );
        let session = Session::new(engine, manager(5));

        let response = session.send(&request(HttpMethod::Get)).unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(session.engine().calls(), 1);
    }

    #[test]
    fn empty_status_codes_disable_status_retries() {
        let engine = ScriptedEngine::new(Vec::new(), Ok(MockResponse::new(503)));
        let retries = RetryManager::builder()
            .max_attempts(5)
            .status_codes(Vec::new())
            .build()
            .unwrap();
        let session = Session::new(engine, retries);

        session.send(&request(HttpMethod::Get)).unwrap();

        assert_eq!(session.engine().calls(), 1);
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let engine = ScriptedEngine::new(
            vec![Ok(MockResponse::new(429).with_header("Retry-After", "1"))],
            Ok(MockResponse::new(200)),
        );
        let session = Session::new(engine, manager(2));
        let started = Instant::now();

        session.send(&request(HttpMethod::Get)).unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(session.engine().calls(), 2);
    }

    #[tokio::test]
    async fn cooperative_session_retries_like_blocking() {
        let engine = ScriptedEngine::new(
            vec![Err(FailureKind::ConnectTimeout), Ok(MockResponse::new(413))],
            Ok(MockResponse::new(201)),
        );
        let session = AsyncSession::new(engine, manager(3));

        let response = session.send(&request(HttpMethod::Put)).await.unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(session.engine().calls(), 3);
    }

    #[tokio::test]
    async fn cooperative_post_is_not_retried() {
        let engine = ScriptedEngine::new(Vec::new(), Err(FailureKind::Connect));
        let session = AsyncSession::new(engine, manager(3));

        let cause = session.stream(&request(HttpMethod::Post)).await.unwrap_err();

        assert_eq!(cause.kind(), FailureKind::Connect);
        assert_eq!(session.engine().calls(), 1);
    }
}
