//! Port interfaces for transports
//!
//! These traits define the boundary between the service layer and the
//! network engine. A transport turns a [`Request`] into a [`SentRequest`]
//! record and a response, retrying internally; only the final outcome
//! crosses this boundary.

use std::time::Duration;

use async_trait::async_trait;
use courier_domain::{Cause, HeaderList, Request, Response, SentRequest, TransportError};

/// Response whose body is read incrementally.
///
/// Dropping the value releases the underlying connection, whether or not
/// the body was consumed.
pub trait StreamingResponse: Send {
    fn status_code(&self) -> u16;

    fn reason(&self) -> &str;

    fn headers(&self) -> &HeaderList;

    fn elapsed(&self) -> Duration;

    /// Whether the status is 2xx
    fn ok(&self) -> bool {
        courier_domain::is_success(self.status_code())
    }

    /// Drain the rest of the body and return it. Bytes already handed out
    /// by incremental reads are not included. Repeated calls return the
    /// cached rest.
    ///
    /// # Errors
    /// Returns the classified engine failure if the body cannot be read.
    fn read(&mut self) -> Result<&[u8], Cause>;
}

/// Cooperative counterpart of [`StreamingResponse`]
#[async_trait]
pub trait AsyncStreamingResponse: Send {
    fn status_code(&self) -> u16;

    fn reason(&self) -> &str;

    fn headers(&self) -> &HeaderList;

    fn elapsed(&self) -> Duration;

    fn ok(&self) -> bool {
        courier_domain::is_success(self.status_code())
    }

    /// Drain the rest of the body and return it, without the bytes already
    /// handed out by incremental reads. Repeated calls return the cached rest.
    ///
    /// # Errors
    /// Returns the classified engine failure if the body cannot be read.
    async fn read(&mut self) -> Result<&[u8], Cause>;
}

/// Blocking transport
pub trait BlockingTransport: Send + Sync {
    type Stream: StreamingResponse;

    /// Send and buffer the whole response
    ///
    /// # Errors
    /// Returns a [`TransportError`] when the request cannot be assembled or
    /// its final attempt fails. Non-2xx responses are not errors here.
    fn send(&self, request: &Request) -> Result<(SentRequest, Response), TransportError>;

    /// Send and hand back the response before its body is read
    ///
    /// # Errors
    /// Same as [`send`](Self::send).
    fn stream(&self, request: &Request) -> Result<(SentRequest, Self::Stream), TransportError>;
}

/// Cooperative transport
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    type Stream: AsyncStreamingResponse;

    /// Send and buffer the whole response
    ///
    /// # Errors
    /// Returns a [`TransportError`] when the request cannot be assembled or
    /// its final attempt fails.
    async fn send(&self, request: &Request) -> Result<(SentRequest, Response), TransportError>;

    /// Send and hand back the response before its body is read
    ///
    /// # Errors
    /// Same as [`send`](Self::send).
    async fn stream(&self, request: &Request)
        -> Result<(SentRequest, Self::Stream), TransportError>;
}
