//! Conversions from reqwest errors into classified attempt failures.
//!
//! The retry guard decides on suppression by [`FailureKind`], so every
//! engine error is classified once, here, before it reaches the session.

use courier_common::resilience::retry::FailureKind;
use courier_domain::Cause;
use reqwest::Error as HttpError;

/// Extension trait to make the conversion explicit at call sites
pub trait IntoCause {
    fn into_cause(self) -> Cause;
}

/// Classify a reqwest error.
///
/// Order matters: a connect timeout reports both `is_connect` and
/// `is_timeout`, and must not be mistaken for a read timeout.
pub fn classify(err: &HttpError) -> FailureKind {
    if err.is_timeout() && err.is_connect() {
        FailureKind::ConnectTimeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else if err.is_timeout() {
        FailureKind::ReadTimeout
    } else if err.is_request() {
        FailureKind::Request
    } else if err.is_body() {
        FailureKind::Body
    } else if err.is_decode() {
        FailureKind::Decode
    } else if err.is_redirect() {
        FailureKind::Redirect
    } else if err.is_builder() {
        FailureKind::Builder
    } else {
        FailureKind::Other
    }
}

impl IntoCause for HttpError {
    fn into_cause(self) -> Cause {
        Cause::new(classify(&self), self)
    }
}

impl IntoCause for std::io::Error {
    fn into_cause(self) -> Cause {
        let kind = match self.kind() {
            std::io::ErrorKind::TimedOut => FailureKind::ReadTimeout,
            _ => FailureKind::Body,
        };
        Cause::new(kind, self)
    }
}
