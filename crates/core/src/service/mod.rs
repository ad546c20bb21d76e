//! Service layer
//!
//! A service binds a transport to a set of service-level headers and turns
//! transport outcomes into the caller-facing error model:
//! - transport failures become transport-kind [`ServiceError`]s
//! - non-2xx responses become HTTP-kind [`ServiceError`]s, with streamed
//!   bodies drained first so the body is available for diagnostics
//! - requests the transport refuses to assemble become
//!   [`CourierError::InvalidRequest`]

mod blocking;
mod cooperative;

pub use blocking::Service;
pub use cooperative::AsyncService;
use courier_domain::{
    CourierError, FilePart, Header, HttpMethod, Request, RequestBody, Result, SentRequest,
    ServiceError, TransportError,
};
use serde_json::Value;
use tracing::debug;

/// Per-call request settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    headers: Vec<Header>,
    params: Vec<(String, String)>,
    body: Option<RequestBody>,
    json: Option<Value>,
    files: Vec<(String, FilePart)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call-level header, sent after the service-level headers
    #[must_use]
    pub fn header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    #[must_use]
    pub fn headers<I: IntoIterator<Item = Header>>(mut self, headers: I) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn json_value(mut self, value: Value) -> Self {
        self.json = Some(value);
        self
    }

    /// JSON payload from any serializable value
    ///
    /// # Errors
    /// Returns [`CourierError::InvalidRequest`] if `value` has no JSON form.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|err| CourierError::InvalidRequest(format!("json payload: {err}")))?;
        Ok(self.json_value(value))
    }

    #[must_use]
    pub fn file(mut self, field: impl Into<String>, part: FilePart) -> Self {
        self.files.push((field.into(), part));
        self
    }

    /// Build the request. Payload fields are dropped when `with_payload` is
    /// false, as for GET.
    fn into_request(
        self,
        method: HttpMethod,
        path: &str,
        service_headers: &[Header],
        with_payload: bool,
    ) -> Request {
        let mut request = Request::new(method, path)
            .params(self.params)
            .with_headers(service_headers.iter().cloned())
            .with_headers(self.headers);
        if !with_payload {
            return request;
        }
        if let Some(body) = self.body {
            request = request.body(body);
        }
        if let Some(json) = self.json {
            request = request.json_value(json);
        }
        for (field, part) in self.files {
            request = request.file(field, part);
        }
        request
    }
}

/// Turn HTTP errors with one of `statuses` into `Ok(None)`.
///
/// Transport errors and HTTP errors with other statuses pass through.
///
/// # Errors
/// Returns the original error when it is not a suppressed HTTP error.
pub fn suppress_http_error<T>(result: Result<T>, statuses: &[u16]) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CourierError::Service(err))
            if err.is_http() && err.response_code().is_some_and(|code| statuses.contains(&code)) =>
        {
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn transport_failure(err: TransportError) -> CourierError {
    match err {
        TransportError::Failed { request, cause } => {
            ServiceError::transport(&request, &cause).into()
        }
        other => CourierError::InvalidRequest(other.to_string()),
    }
}

fn http_failure(sent: &SentRequest, response: courier_domain::ResponseSnapshot) -> CourierError {
    debug!(
        method = %sent.method(),
        url = %sent.url(),
        status = response.status_code,
        "Unsuccessful response"
    );
    ServiceError::http(sent, response).into()
}
