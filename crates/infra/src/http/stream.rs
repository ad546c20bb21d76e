//! Streamed responses
//!
//! The body stays on the connection until it is pulled. Dropping a stream
//! releases the connection whether or not the body was consumed.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use courier_common::resilience::retry::ResponseView;
use courier_core::{AsyncStreamingResponse, StreamingResponse};
use courier_domain::{Cause, HeaderList};
use futures::{stream, Stream, StreamExt};
use tracing::debug;

use super::engine::{header_list, reason};
use crate::errors::IntoCause;

/// Read size used by line iteration and draining
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Blocking streamed response
///
/// The client's read timeout covers the whole body, so reading must finish
/// within `read_timeout_in_seconds` of sending the request.
///
/// [`read`](StreamingResponse::read) returns only the part of the body not
/// yet handed out by [`chunk`](Self::chunk), [`chunks`](Self::chunks) or
/// [`lines`](Self::lines).
pub struct StreamResponse {
    inner: Option<reqwest::blocking::Response>,
    status: u16,
    reason: &'static str,
    headers: HeaderList,
    elapsed: Duration,
    pending: Vec<u8>,
    body: Vec<u8>,
}

impl StreamResponse {
    pub(crate) fn new(response: reqwest::blocking::Response, elapsed: Duration) -> Self {
        let status = response.status();
        Self {
            status: status.as_u16(),
            reason: reason(status),
            headers: header_list(response.headers()),
            elapsed,
            inner: Some(response),
            pending: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Next chunk of at most `max` bytes, `None` once the body is exhausted
    ///
    /// # Errors
    /// Returns the classified failure if the connection breaks mid-body.
    pub fn chunk(&mut self, max: usize) -> Result<Option<Vec<u8>>, Cause> {
        if !self.pending.is_empty() {
            let take = self.pending.len().min(max.max(1));
            return Ok(Some(self.pending.drain(..take).collect()));
        }
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        let mut buf = vec![0; max.max(1)];
        let read = inner.read(&mut buf).map_err(IntoCause::into_cause)?;
        if read == 0 {
            self.inner = None;
            return Ok(None);
        }
        buf.truncate(read);
        Ok(Some(buf))
    }

    /// Iterate the body in chunks of at most `size` bytes
    pub fn chunks(&mut self, size: usize) -> impl Iterator<Item = Result<Vec<u8>, Cause>> + '_ {
        std::iter::from_fn(move || self.chunk(size).transpose())
    }

    /// Iterate the body line by line. Line terminators are stripped.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { stream: self, done: false }
    }

    /// Body as lossy UTF-8, draining what is left
    ///
    /// # Errors
    /// Same as [`read`](StreamingResponse::read).
    pub fn text(&mut self) -> Result<String, Cause> {
        let body = StreamingResponse::read(self)?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }

    /// Release the connection now
    pub fn close(self) {}

    fn next_line(&mut self) -> Result<Option<String>, Cause> {
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(Some(trim_line(&line)));
            }
            let Some(inner) = self.inner.as_mut() else {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.pending);
                return Ok(Some(trim_line(&line)));
            };
            let mut buf = vec![0; DEFAULT_CHUNK_SIZE];
            let read = inner.read(&mut buf).map_err(IntoCause::into_cause)?;
            if read == 0 {
                self.inner = None;
            } else {
                self.pending.extend_from_slice(&buf[..read]);
            }
        }
    }
}

/// Line iterator over a [`StreamResponse`]
pub struct Lines<'a> {
    stream: &'a mut StreamResponse,
    done: bool,
}

impl Iterator for Lines<'_> {
    type Item = Result<String, Cause>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.stream.next_line().transpose();
        // a broken connection ends the iteration after its error
        if matches!(next, None | Some(Err(_))) {
            self.done = true;
        }
        next
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("open", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for StreamResponse {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            debug!(status = self.status, "Releasing unread streamed response");
        }
    }
}

impl ResponseView for StreamResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

impl StreamingResponse for StreamResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn reason(&self) -> &str {
        self.reason
    }

    fn headers(&self) -> &HeaderList {
        &self.headers
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn read(&mut self) -> Result<&[u8], Cause> {
        let mut rest = std::mem::take(&mut self.pending);
        if let Some(mut inner) = self.inner.take() {
            inner.read_to_end(&mut rest).map_err(IntoCause::into_cause)?;
        }
        self.body.extend_from_slice(&rest);
        Ok(&self.body)
    }
}

/// Cooperative streamed response
pub struct AsyncStreamResponse {
    inner: Option<reqwest::Response>,
    status: u16,
    reason: &'static str,
    headers: HeaderList,
    elapsed: Duration,
    pending: Vec<u8>,
    body: Vec<u8>,
}

impl AsyncStreamResponse {
    pub(crate) fn new(response: reqwest::Response, elapsed: Duration) -> Self {
        let status = response.status();
        Self {
            status: status.as_u16(),
            reason: reason(status),
            headers: header_list(response.headers()),
            elapsed,
            inner: Some(response),
            pending: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Next chunk as delivered by the connection, `None` at the end
    ///
    /// # Errors
    /// Returns the classified failure if the connection breaks mid-body.
    pub async fn chunk(&mut self) -> Result<Option<Vec<u8>>, Cause> {
        if !self.pending.is_empty() {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }
        self.pull().await
    }

    /// Next line with its terminator stripped, `None` at the end
    ///
    /// # Errors
    /// Returns the classified failure if the connection breaks mid-body.
    pub async fn next_line(&mut self) -> Result<Option<String>, Cause> {
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(Some(trim_line(&line)));
            }
            match self.pull().await? {
                Some(bytes) => self.pending.extend_from_slice(&bytes),
                None if self.pending.is_empty() => return Ok(None),
                None => {
                    let line = std::mem::take(&mut self.pending);
                    return Ok(Some(trim_line(&line)));
                }
            }
        }
    }

    /// Turn the rest of the body into a stream of chunks
    pub fn into_bytes_stream(mut self) -> impl Stream<Item = Result<Vec<u8>, Cause>> + Send {
        let pending = std::mem::take(&mut self.pending);
        let head = stream::iter((!pending.is_empty()).then(|| Ok(pending)));
        let tail = match self.inner.take() {
            Some(response) => response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(IntoCause::into_cause))
                .left_stream(),
            None => stream::empty().right_stream(),
        };
        head.chain(tail)
    }

    /// Body as lossy UTF-8, draining what is left
    ///
    /// # Errors
    /// Same as [`read`](AsyncStreamingResponse::read).
    pub async fn text(&mut self) -> Result<String, Cause> {
        let body = AsyncStreamingResponse::read(self).await?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }

    /// Release the connection now
    pub fn close(self) {}

    async fn pull(&mut self) -> Result<Option<Vec<u8>>, Cause> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        match inner.chunk().await.map_err(IntoCause::into_cause)? {
            Some(bytes) => Ok(Some(bytes.to_vec())),
            None => {
                self.inner = None;
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for AsyncStreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncStreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("open", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for AsyncStreamResponse {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            debug!(status = self.status, "Releasing unread streamed response");
        }
    }
}

impl ResponseView for AsyncStreamResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

#[async_trait]
impl AsyncStreamingResponse for AsyncStreamResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn reason(&self) -> &str {
        self.reason
    }

    fn headers(&self) -> &HeaderList {
        &self.headers
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    async fn read(&mut self) -> Result<&[u8], Cause> {
        let mut rest = std::mem::take(&mut self.pending);
        while let Some(bytes) = self.pull().await? {
            rest.extend_from_slice(&bytes);
        }
        self.body.extend_from_slice(&rest);
        Ok(&self.body)
    }
}

fn trim_line(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_line_strips_both_terminators() {
        assert_eq!(trim_line(b"data: 1\r\n"), "data: 1");
        assert_eq!(trim_line(b"data: 2\n"), "data: 2");
        assert_eq!(trim_line(b"tail"), "tail");
    }
}
