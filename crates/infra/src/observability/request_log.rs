//! Structured log record for a request about to be sent

use courier_domain::{HttpMethod, SentRequest};
use tracing::info;

/// Log view of a [`SentRequest`]. Header values are always filtered.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogRecord<'a> {
    request: &'a SentRequest,
}

impl<'a> RequestLogRecord<'a> {
    pub const fn new(request: &'a SentRequest) -> Self {
        Self { request }
    }

    /// `Sending GET <url>`, or `Sending <METHOD> <url> (body: <size>)`
    pub fn message(&self) -> String {
        let request = self.request;
        if request.method() == HttpMethod::Get {
            format!("Sending {} {}", request.method(), request.url())
        } else {
            format!("Sending {} {} (body: {})", request.method(), request.url(), self.body_size())
        }
    }

    pub fn method(&self) -> &'static str {
        self.request.method().as_str()
    }

    pub fn url(&self) -> &'a str {
        self.request.url()
    }

    /// One `name: value` line per header, values filtered
    pub fn headers(&self) -> String {
        self.request.headers().iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    }

    /// Byte length of the captured body, 0 when there is none
    pub fn body_size(&self) -> usize {
        self.request.body_size()
    }

    /// Emit the record at `info` level
    pub fn emit(&self) {
        info!(
            method = self.method(),
            url = self.url(),
            headers = %self.headers(),
            body_size = self.body_size(),
            "{}",
            self.message()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use courier_domain::Header;

    use super::*;

    fn sent(method: HttpMethod, body: Option<&str>) -> SentRequest {
        SentRequest::new(
            method,
            "http://service.test/items?page=2".to_string(),
            vec![Header::new("accept", "application/json"), Header::sensitive("x-api-key", "s3cret")],
            body.map(|b| b.as_bytes().to_vec()),
            BTreeMap::new(),
        )
    }

    #[test]
    fn get_message_has_no_body_size() {
        let request = sent(HttpMethod::Get, None);
        let record = RequestLogRecord::new(&request);

        assert_eq!(record.message(), "Sending GET http://service.test/items?page=2");
        assert_eq!(record.body_size(), 0);
    }

    #[test]
    fn other_methods_report_byte_length() {
        let request = sent(HttpMethod::Post, Some("{\"name\":\"é\"}"));
        let record = RequestLogRecord::new(&request);

        assert_eq!(
            record.message(),
            "Sending POST http://service.test/items?page=2 (body: 13)"
        );
        assert_eq!(record.method(), "POST");
    }

    #[test]
    fn headers_are_joined_and_filtered() {
        let request = sent(HttpMethod::Delete, None);
        let record = RequestLogRecord::new(&request);

        assert_eq!(record.headers(), "accept: application/json\nx-api-key: [filtered]");
        assert!(!record.headers().contains("s3cret"));
    }
}
