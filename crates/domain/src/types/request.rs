//! Logical request description

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use super::header::Header;
use super::header_list::HeaderList;
use super::method::HttpMethod;
use crate::errors::{CourierError, Result};

/// Raw request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Bytes(Vec<u8>),
}

impl RequestBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Body as text, lossy for non UTF-8 bytes
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for RequestBody {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// One file of a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

impl FilePart {
    /// Anonymous part with `content`
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self { file_name: None, content: content.into(), content_type: None }
    }

    /// Part with a file name and a MIME type
    pub fn named(
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content: content.into(),
            content_type: Some(content_type.into()),
        }
    }
}

/// What the caller wants sent.
///
/// Only one of `json`, `body` or `files` is normally set. `body` and `files`
/// may be combined, in which case the body travels as a form field. The
/// transport rejects every other combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: HttpMethod,
    path: String,
    params: Vec<(String, String)>,
    headers: Vec<Header>,
    body: Option<RequestBody>,
    json: Option<Value>,
    files: Option<Vec<(String, FilePart)>>,
}

impl Request {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            json: None,
            files: None,
        }
    }

    /// Append one query parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Append query parameters in order
    #[must_use]
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.params.extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Append one header
    #[must_use]
    pub fn header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Append headers after the existing ones. Duplicates are kept.
    #[must_use]
    pub fn with_headers<I: IntoIterator<Item = Header>>(mut self, headers: I) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set an already built JSON value
    #[must_use]
    pub fn json_value(mut self, value: Value) -> Self {
        self.json = Some(value);
        self
    }

    /// Set the JSON payload from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::InvalidRequest`] if `value` cannot be
    /// represented as JSON, e.g. a map with non-string keys.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|err| CourierError::InvalidRequest(format!("json payload: {err}")))?;
        Ok(self.json_value(value))
    }

    /// Add a multipart file under form field `field`
    #[must_use]
    pub fn file(mut self, field: impl Into<String>, part: FilePart) -> Self {
        self.files.get_or_insert_with(Vec::new).push((field.into(), part));
        self
    }

    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub const fn raw_body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub const fn json_payload(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn files(&self) -> Option<&[(String, FilePart)]> {
        self.files.as_deref()
    }

    /// Path with the URL-encoded query string, if any parameters are set
    pub fn full_path(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }

    /// `base_url` without trailing slashes joined to the full path without
    /// leading slashes
    pub fn build_absolute_url(&self, base_url: &str) -> String {
        let full_path = self.full_path();
        format!("{}/{}", base_url.trim_end_matches('/'), full_path.trim_start_matches('/'))
    }

    /// Headers as they may appear in logs
    pub fn filtered_headers(&self) -> HeaderList {
        self.headers.iter().map(|h| (h.name().to_string(), h.filtered_value())).collect()
    }
}
