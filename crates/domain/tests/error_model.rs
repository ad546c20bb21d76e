//! Integration tests for the error model
//!
//! Exercises service errors the way callers see them: built from a sent
//! request, rendered for logs, stored and restored.

use std::collections::BTreeMap;

use courier_common::resilience::retry::FailureKind;
use courier_domain::{
    Cause, CourierError, Header, HeaderList, HttpMethod, Request, Response, ResponseSnapshot,
    SentRequest, ServiceError, ServiceErrorKind,
};

fn sent_request(request: &Request, base_url: &str) -> SentRequest {
    let headers = request
        .headers()
        .iter()
        .map(|h| Header::with_sensitivity(h.name().to_lowercase(), h.value(), h.is_sensitive()))
        .collect();
    SentRequest::new(
        request.method(),
        request.build_absolute_url(base_url),
        headers,
        request.raw_body().map(|body| body.as_bytes().to_vec()),
        BTreeMap::new(),
    )
}

/// Test that a bearer token never reaches the rendered or stored error
///
/// Scenario: a POST with credentials is rejected with 401
#[test]
fn test_http_error_never_leaks_credentials() {
    let request = Request::new(HttpMethod::Post, "/orders")
        .header(Header::bearer("super-secret-token"))
        .header(Header::new("X-Trace", "abc"))
        .body("{}");
    let sent = sent_request(&request, "https://api.example.com/");
    let response = Response::new(
        401,
        "Unauthorized",
        [("www-authenticate", "Bearer")].into_iter().collect::<HeaderList>(),
        std::time::Duration::from_millis(12),
        b"token expired".to_vec(),
    );

    let err = ServiceError::http(&sent, ResponseSnapshot::from(&response));
    let rendered = err.to_string();
    let stored = serde_json::to_string(&err).unwrap();

    assert!(rendered.contains("Request: POST https://api.example.com/orders"));
    assert!(rendered.contains("\"authorization\": \"[filtered]\""));
    assert!(rendered.contains("\"x-trace\": \"abc\""));
    assert!(rendered.contains("Response: 401 Unauthorized"));
    assert!(rendered.contains("Response body: token expired"));
    assert!(!rendered.contains("super-secret-token"));
    assert!(!stored.contains("super-secret-token"));
    assert_eq!(err.response_code(), Some(401));
    assert!(!err.is_bad_request());
}

/// Test restoring a transport error from its stored form
///
/// Validates that the restored error renders the same message and keeps the
/// cause chain, most recent first
#[test]
fn test_transport_error_restores_from_json() {
    let request = Request::new(HttpMethod::Get, "/health").param("verbose", true);
    let sent = sent_request(&request, "http://localhost:1");
    let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused by peer");
    let cause = Cause::new(FailureKind::Connect, inner);

    let err = ServiceError::transport(&sent, &cause);
    let restored: ServiceError =
        serde_json::from_value(serde_json::to_value(&err).unwrap()).unwrap();

    assert_eq!(restored.kind(), ServiceErrorKind::Transport);
    assert_eq!(restored.causes(), err.causes());
    assert_eq!(restored.causes()[0].message, "refused by peer");
    assert_eq!(restored.request().url, "http://localhost:1/health?verbose=true");
    assert_eq!(restored.to_string(), err.to_string());
    assert!(restored.to_string().starts_with("ConnectError: refused by peer\n"));
}

/// Test that a hand-built error chain round trips verbatim
#[test]
fn test_from_parts_round_trip() {
    let err = ServiceError::from_parts(
        ServiceErrorKind::Transport,
        courier_domain::RequestSnapshot {
            method: "GET".into(),
            url: "http://host/".into(),
            headers: HeaderList::new(),
            proxies: BTreeMap::new(),
        },
        None,
        vec![
            courier_domain::ErrorRecord::new(Some("ReadTimeout".into()), "timed out"),
            courier_domain::ErrorRecord::new(None, "operation timed out"),
            courier_domain::ErrorRecord::new(None, "deadline has elapsed"),
        ],
    );

    let restored: ServiceError =
        serde_json::from_str(&serde_json::to_string(&err).unwrap()).unwrap();
    let courier: CourierError = restored.clone().into();

    assert_eq!(restored, err);
    assert_eq!(restored.causes()[2].message, "deadline has elapsed");
    assert!(courier.to_string().starts_with("ReadTimeout: timed out"));
}
