//! Cooperative service, the async twin of [`Service`](super::Service)

use courier_domain::{
    Header, HttpMethod, Request, Response, ResponseSnapshot, Result, ServiceError,
};

use super::{http_failure, transport_failure, RequestOptions};
use crate::transport::{AsyncStreamingResponse, AsyncTransport};

/// Convenience client bound to one async transport
pub struct AsyncService<T> {
    transport: T,
    headers: Vec<Header>,
}

impl<T: AsyncTransport> AsyncService<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport, headers: Vec::new() }
    }

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

    /// # Errors
    /// - `CourierError::Service` for transport failures and non-2xx responses
    /// - `CourierError::InvalidRequest` when the request cannot be assembled
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let (sent, response) = self.transport.send(request).await.map_err(transport_failure)?;
        if !response.ok() {
            return Err(http_failure(&sent, ResponseSnapshot::from(&response)));
        }
        Ok(response)
    }

    /// # Errors
    /// Same as [`request`](Self::request); a non-2xx body is drained first.
    pub async fn stream_request(&self, request: &Request) -> Result<T::Stream> {
        let (sent, mut stream) =
            self.transport.stream(request).await.map_err(transport_failure)?;
        if stream.ok() {
            return Ok(stream);
        }
        let body = match stream.read().await {
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
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Get, path, options)).await
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Post, path, options)).await
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Put, path, options)).await
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub async fn patch(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Patch, path, options)).await
    }

    /// # Errors
    /// See [`request`](Self::request).
    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(&self.build(HttpMethod::Delete, path, options)).await
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub async fn get_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Get, path, options)).await
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub async fn post_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Post, path, options)).await
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub async fn put_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Put, path, options)).await
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub async fn patch_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Patch, path, options)).await
    }

    /// # Errors
    /// See [`stream_request`](Self::stream_request).
    pub async fn delete_stream(&self, path: &str, options: RequestOptions) -> Result<T::Stream> {
        self.stream_request(&self.build(HttpMethod::Delete, path, options)).await
    }

    fn build(&self, method: HttpMethod, path: &str, options: RequestOptions) -> Request {
        options.into_request(method, path, &self.headers, method != HttpMethod::Get)
    }
}
