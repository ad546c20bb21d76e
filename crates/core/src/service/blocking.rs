//! Blocking service

use courier_domain::{
    Header, HttpMethod, Request, Response, ResponseSnapshot, Result, ServiceError,
};

use super::{http_failure, transport_failure, RequestOptions};
use crate::transport::{BlockingTransport, StreamingResponse};

/// Convenience client bound to one transport and one set of service headers
pub struct Service<T> {
    transport: T,
    headers: Vec<Header>,
}

impl<T: BlockingTransport> Service<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport, headers: Vec::new() }
    }

    /// Headers sent with every request, before call-level headers
    #[must_use]
    pub fn with_headers<I: IntoIterator<Item = Header>>(mut self, headers: I) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` as-is and fail on non-2xx responses
    ///
    /// # Errors
    /// - `CourierError::Service` for transport failures and non-2xx responses
    /// - `CourierError::InvalidRequest` when the request cannot be assembled
    pub fn request(&self, request: &Request) -> Result<Response> {
        let (sent, response) = self.transport.send(request).map_err(transport_failure)?;
        if !response.ok() {
            return Err(http_failure(&sent, ResponseSnapshot::from(&response)));
        }
        Ok(response)
    }

    /// Streaming counterpart of [`request`](Self::request). A non-2xx body is
    /// drained into the error before the stream is released.
    ///
    /// # Errors
    /// Same as [`request`](Self::request).
    pub fn stream_request(&self, request: &Request) -> Result<T::Stream> {
        let (sent, mut stream) = self.transport.stream(request).map_err(transport_failure)?;
        if stream.ok() {
            return Ok(stream);
        }
        let body = match stream.read() {
            Ok(body) => String::from_utf8_lossy(body).into_owned(),
            Err(cause) => return Err(ServiceError::transport(&sent, &cause).into()),
        };
        let snapshot = ResponseSnapshot {
            status_code: stream.status_code(),
            reason: stream.reason().to_string(),
            headers: stream.headers().clone(),
            body,
        };
        Err(http_failure(&sent, snapshot))
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub fn get(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Get, path, options))
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub fn post(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Post, path, options))
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub fn put(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Put, path, options))
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub fn patch(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Patch, path, options))
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub fn delete(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Delete, path, options))
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub fn get_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Get, path, options))
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub fn post_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Post, path, options))
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub fn put_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Put, path, options))
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub fn patch_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Patch, path, options))
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub fn delete_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Delete, path, options))
    }

    fn build(&self, method: HttpMethod, path: &str, options: RequestOptions) -> Request {
        options.into_request(method, path, &self.headers, method != HttpMethod::Get)
    }
}
