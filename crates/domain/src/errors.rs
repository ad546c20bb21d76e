//! Error types used throughout Courier
//!
//! Three layers:
//! - [`Cause`]: one classified attempt failure from the network engine
//! - [`TransportError`]: a request that could not be assembled, or whose
//!   final attempt failed
//! - [`ServiceError`]: what a service call surfaces, either a transport
//!   failure or a non-2xx response, with a serializable snapshot of the
//!   request and response for diagnostics

use std::collections::BTreeMap;
use std::error::Error as _;
use std::fmt;

use courier_common::resilience::retry::{ClassifyFailure, FailureKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::HTTP_BAD_REQUEST;
use crate::types::{HeaderList, Response, SentRequest};

/// Boxed error from a network engine
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for Courier
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Service(Box<ServiceError>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// The service error, if this is one
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServiceError> for CourierError {
    fn from(err: ServiceError) -> Self {
        Self::Service(Box::new(err))
    }
}

/// Result type alias for Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;

/// A classified attempt failure
#[derive(Debug, Error)]
#[error("{kind}: {source}")]
pub struct Cause {
    kind: FailureKind,
    #[source]
    source: BoxError,
}

impl Cause {
    pub fn new(kind: FailureKind, source: impl Into<BoxError>) -> Self {
        Self { kind, source: source.into() }
    }

    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Message of the underlying error
    pub fn message(&self) -> String {
        self.source.to_string()
    }

    pub fn into_source(self) -> BoxError {
        self.source
    }
}

impl ClassifyFailure for Cause {
    fn failure_kind(&self) -> FailureKind {
        self.kind
    }
}

/// Failure of the transport layer
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("json and files can't be sent together")]
    JsonWithFiles,

    #[error("json and body can't be sent together")]
    JsonWithBody,

    #[error("json encoding failed: {0}")]
    Encode(String),

    /// The final attempt failed; carries what was sent
    #[error("{cause}")]
    Failed {
        request: Box<SentRequest>,
        #[source]
        cause: Cause,
    },
}

impl TransportError {
    pub fn failed(request: SentRequest, cause: Cause) -> Self {
        Self::Failed { request: Box::new(request), cause }
    }

    /// The sent request, for failures that got that far
    pub fn request(&self) -> Option<&SentRequest> {
        match self {
            Self::Failed { request, .. } => Some(request),
            _ => None,
        }
    }

    /// Kind of the attempt failure, for failures that got that far
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed { cause, .. } => Some(cause.kind()),
            _ => None,
        }
    }
}

/// Whether a service error came from the transport or from the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    Transport,
    Http,
}

/// One link of an error chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: Option<String>,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(kind: Option<String>, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{kind}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Request part of a service error. Headers are stored filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    pub headers: HeaderList,
    pub proxies: BTreeMap<String, String>,
}

impl From<&SentRequest> for RequestSnapshot {
    fn from(request: &SentRequest) -> Self {
        Self {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            headers: request.filtered_headers(),
            proxies: request.proxies().clone(),
        }
    }
}

/// Response part of a service error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    pub reason: String,
    pub headers: HeaderList,
    pub body: String,
}

impl From<&Response> for ResponseSnapshot {
    fn from(response: &Response) -> Self {
        Self {
            status_code: response.status_code(),
            reason: response.reason().to_string(),
            headers: response.headers().clone(),
            body: response.text().into_owned(),
        }
    }
}

/// Error surfaced by a service call.
///
/// Rendered as newline-separated sections, empty ones left out:
///
/// ```text
/// ConnectError: connection refused        <- most recent cause, if any
/// Request: GET http://host/path
/// Request headers: {"authorization": "[filtered]"}
/// Proxies: {}
/// Response: 503 Service Unavailable       <- response sections, if any
/// Response headers: {...}
/// Response body: ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    kind: ServiceErrorKind,
    request: RequestSnapshot,
    response: Option<ResponseSnapshot>,
    causes: Vec<ErrorRecord>,
}

impl ServiceError {
    /// Error for a non-2xx response
    pub fn http(request: &SentRequest, response: ResponseSnapshot) -> Self {
        Self {
            kind: ServiceErrorKind::Http,
            request: request.into(),
            response: Some(response),
            causes: Vec::new(),
        }
    }

    /// Error for a failed final attempt. The cause chain is captured from
    /// `cause` downwards.
    pub fn transport(request: &SentRequest, cause: &Cause) -> Self {
        let mut causes = vec![ErrorRecord::new(Some(cause.kind().to_string()), cause.message())];
        let mut next = std::error::Error::source(cause).and_then(|err| err.source());
        while let Some(err) = next {
            causes.push(ErrorRecord::new(None, err.to_string()));
            next = err.source();
        }
        Self { kind: ServiceErrorKind::Transport, request: request.into(), response: None, causes }
    }

    /// Build from parts, e.g. when restoring from storage
    pub fn from_parts(
        kind: ServiceErrorKind,
        request: RequestSnapshot,
        response: Option<ResponseSnapshot>,
        causes: Vec<ErrorRecord>,
    ) -> Self {
        Self { kind, request, response, causes }
    }

    pub const fn kind(&self) -> ServiceErrorKind {
        self.kind
    }

    pub fn is_http(&self) -> bool {
        self.kind == ServiceErrorKind::Http
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ServiceErrorKind::Transport
    }

    pub const fn request(&self) -> &RequestSnapshot {
        &self.request
    }

    pub const fn response(&self) -> Option<&ResponseSnapshot> {
        self.response.as_ref()
    }

    /// Cause chain, most recent first
    pub fn causes(&self) -> &[ErrorRecord] {
        &self.causes
    }

    pub fn response_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status_code)
    }

    pub fn response_body(&self) -> Option<&str> {
        self.response.as_ref().map(|r| r.body.as_str())
    }

    pub fn is_bad_request(&self) -> bool {
        self.response_code() == Some(HTTP_BAD_REQUEST)
    }

    fn sections(&self) -> Vec<String> {
        let mut sections = Vec::with_capacity(7);
        if let Some(cause) = self.causes.first() {
            sections.push(cause.to_string());
        }
        sections.push(format!("Request: {} {}", self.request.method.to_uppercase(), self.request.url));
        sections.push(format!("Request headers: {}", self.request.headers));
        sections.push(format!("Proxies: {:?}", self.request.proxies));
        if let Some(response) = &self.response {
            sections.push(format!("Response: {} {}", response.status_code, response.reason));
            sections.push(format!("Response headers: {}", response.headers));
            sections.push(format!("Response body: {}", response.body));
        }
        sections.retain(|section| !section.is_empty());
        sections
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sections().join("\n"))
    }
}

impl std::error::Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Header, HttpMethod};

    #[derive(Debug, Error)]
    #[error("{message}")]
    struct Chained {
        message: String,
        #[source]
        source: Option<Box<Chained>>,
    }

    fn sent() -> SentRequest {
        let mut proxies = BTreeMap::new();
        proxies.insert("https".to_string(), "http://proxy:3128".to_string());
        SentRequest::new(
            HttpMethod::Get,
            "http://host/items",
            vec![Header::new("accept", "*/*"), Header::with_sensitivity("authorization", "t", true)],
            None,
            proxies,
        )
    }

    fn chained_cause() -> Cause {
        let root = Chained { message: "os error 111".into(), source: None };
        let middle = Chained { message: "tcp connect error".into(), source: Some(Box::new(root)) };
        let top = Chained { message: "connection refused".into(), source: Some(Box::new(middle)) };
        Cause::new(FailureKind::Connect, top)
    }

    #[test]
    fn cause_renders_kind_and_message() {
        let cause = Cause::new(FailureKind::ReadTimeout, "timed out");
        assert_eq!(cause.to_string(), "ReadTimeout: timed out");
    }

    #[test]
    fn transport_error_renders_its_cause() {
        let err = TransportError::failed(sent(), Cause::new(FailureKind::Connect, "refused"));

        assert_eq!(err.to_string(), "ConnectError: refused");
        assert_eq!(err.failure_kind(), Some(FailureKind::Connect));
        assert_eq!(err.request().map(SentRequest::url), Some("http://host/items"));
        assert!(TransportError::JsonWithBody.request().is_none());
    }

    #[test]
    fn transport_service_error_captures_chain_most_recent_first() {
        let err = ServiceError::transport(&sent(), &chained_cause());

        let messages: Vec<_> = err.causes().iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["connection refused", "tcp connect error", "os error 111"]);
        assert_eq!(err.causes()[0].kind.as_deref(), Some("ConnectError"));
        assert!(err.is_transport());
        assert_eq!(err.response_code(), None);
    }

    #[test]
    fn transport_service_error_message() {
        let err = ServiceError::transport(&sent(), &chained_cause());
        let text = err.to_string();

        assert!(text.starts_with("ConnectError: connection refused\n"));
        assert!(text.contains("Request: GET http://host/items"));
        assert!(text.contains(r#"Request headers: {"accept": "*/*", "authorization": "[filtered]"}"#));
        assert!(text.contains(r#"Proxies: {"https": "http://proxy:3128"}"#));
        assert!(!text.contains("Response:"));
    }

    #[test]
    fn http_service_error_message_and_helpers() {
        let response = ResponseSnapshot {
            status_code: 400,
            reason: "Bad Request".into(),
            headers: [("content-type", "text/plain")].into_iter().collect(),
            body: "missing field".into(),
        };
        let err = ServiceError::http(&sent(), response);

        assert!(err.is_http());
        assert!(err.is_bad_request());
        assert_eq!(err.response_body(), Some("missing field"));
        let text = err.to_string();
        assert!(text.starts_with("Request: GET"));
        assert!(text.contains("Response: 400 Bad Request"));
        assert!(text.contains(r#"Response headers: {"content-type": "text/plain"}"#));
        assert!(text.ends_with("Response body: missing field"));
    }

    /// Validates the serialization round trip scenario.
    ///
    /// Assertions:
    /// - The restored error equals the original.
    /// - The cause chain survives in order.
    #[test]
    fn serde_round_trip_preserves_cause_chain() {
        let err = ServiceError::transport(&sent(), &chained_cause());

        let encoded = serde_json::to_string(&err).unwrap();
        let restored: ServiceError = serde_json::from_str(&encoded).unwrap();

        assert_eq!(restored, err);
        assert_eq!(restored.causes().len(), 3);
        assert_eq!(restored.to_string(), err.to_string());
        assert!(!encoded.contains("\"t\""));
    }

    #[test]
    fn courier_error_wraps_service_error() {
        let err: CourierError = ServiceError::transport(&sent(), &chained_cause()).into();

        assert!(err.as_service().is_some());
        assert!(err.to_string().starts_with("ConnectError: connection refused"));
        assert!(CourierError::Internal("x".into()).as_service().is_none());
    }
}
