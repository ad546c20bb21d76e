//! Buffered responses

use std::borrow::Cow;
use std::time::Duration;

use courier_common::resilience::retry::ResponseView;
use serde::de::DeserializeOwned;

use super::header_list::HeaderList;

/// Fully read response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: u16,
    reason: String,
    headers: HeaderList,
    elapsed: Duration,
    content: Vec<u8>,
}

impl Response {
    pub fn new(
        status_code: u16,
        reason: impl Into<String>,
        headers: HeaderList,
        elapsed: Duration,
        content: Vec<u8>,
    ) -> Self {
        Self { status_code, reason: reason.into(), headers, elapsed, content }
    }

    /// Whether the status is 2xx
    pub const fn ok(&self) -> bool {
        is_success(self.status_code)
    }

    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub const fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Time from sending the request to receiving the response head
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Body decoded as UTF-8, lossy
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Body parsed as JSON
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.content)
    }
}

impl ResponseView for Response {
    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// Whether `status` is 2xx
pub const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}
