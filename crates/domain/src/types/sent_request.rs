//! Record of what actually went on the wire

use std::collections::BTreeMap;

use super::header::Header;
use super::header_list::HeaderList;
use super::method::HttpMethod;

/// Normalized request as it was sent, kept for logging and diagnostics.
///
/// Header names are those the wire layer used (lower-case); sensitivity is
/// carried over from the request header of the same name. Multipart bodies
/// are not captured.
#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
    method: HttpMethod,
    url: String,
    headers: Vec<Header>,
    body: Option<Vec<u8>>,
    proxies: BTreeMap<String, String>,
}

impl SentRequest {
    pub fn new(
        method: HttpMethod,
        url: impl Into<String>,
        headers: Vec<Header>,
        body: Option<Vec<u8>>,
        proxies: BTreeMap<String, String>,
    ) -> Self {
        Self { method, url: url.into(), headers, body, proxies }
    }

    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Captured body length in bytes, 0 when nothing was captured
    pub fn body_size(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    pub const fn proxies(&self) -> &BTreeMap<String, String> {
        &self.proxies
    }

    /// Headers as they may appear in logs
    pub fn filtered_headers(&self) -> HeaderList {
        self.headers.iter().map(|h| (h.name().to_string(), h.filtered_value())).collect()
    }
}
