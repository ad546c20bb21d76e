//! Network engine primitive
//!
//! An engine performs exactly one physical attempt. It knows nothing about
//! retries: the [`Session`](super::session::Session) drives it once per
//! guard. Two flavours per scheduling model:
//! - `perform` reads the whole body inside the attempt
//! - `perform_streaming` returns as soon as the response head arrives

use std::time::{Duration, Instant};

use async_trait::async_trait;
use courier_common::resilience::retry::ResponseView;
use courier_domain::{
    proxy_scheme, Cause, CourierError, FilePart, HeaderList, HttpMethod, Response, Result,
    TransportConfig,
};
use reqwest::header::HeaderMap;
use reqwest::{Method, Proxy, StatusCode};

use super::stream::{AsyncStreamResponse, StreamResponse};
use crate::errors::IntoCause;

/// Request ready for the wire, rebuilt into an engine request per attempt
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Lower-cased names, in send order, duplicates kept
    pub headers: Vec<(String, String)>,
    pub body: WireBody,
}

/// Wire body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WireBody {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<(String, FilePart)>,
    },
}

/// Blocking engine
pub trait HttpEngine: Send + Sync {
    type Response: ResponseView;
    type Stream: ResponseView;

    /// One attempt, body buffered
    ///
    /// # Errors
    /// Returns the classified failure of the attempt.
    fn perform(&self, request: &WireRequest) -> std::result::Result<Self::Response, Cause>;

    /// One attempt, body left on the connection
    ///
    /// # Errors
    /// Returns the classified failure of the attempt.
    fn perform_streaming(&self, request: &WireRequest)
        -> std::result::Result<Self::Stream, Cause>;
}

/// Cooperative engine
#[async_trait]
pub trait AsyncHttpEngine: Send + Sync {
    type Response: ResponseView + Send;
    type Stream: ResponseView + Send;

    /// # Errors
    /// Returns the classified failure of the attempt.
    async fn perform(&self, request: &WireRequest) -> std::result::Result<Self::Response, Cause>;

    /// # Errors
    /// Returns the classified failure of the attempt.
    async fn perform_streaming(
        &self,
        request: &WireRequest,
    ) -> std::result::Result<Self::Stream, Cause>;
}

/// reqwest blocking client behind [`HttpEngine`]
#[derive(Debug, Clone)]
pub struct ReqwestEngine {
    client: reqwest::blocking::Client,
}

impl ReqwestEngine {
    /// Engine with a client configured from `config`
    ///
    /// The blocking client has no per-read timeout, so the read timeout is
    /// applied to the whole exchange. It also bounds how long a
    /// [`StreamResponse`] body may take to consume; raise
    /// `read_timeout_in_seconds` for long-lived blocking streams.
    ///
    /// # Errors
    /// Returns `CourierError::Config` for invalid proxies or TLS setup.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(config.open_timeout())
            .timeout(config.read_timeout())
            .danger_accept_invalid_certs(config.allow_unverified_peer);
        if config.proxies.is_empty() {
            builder = builder.no_proxy();
        }
        for proxy in proxies(config)? {
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(client_error)?;
        Ok(Self { client })
    }

    /// Engine around an existing client
    pub const fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    fn execute(
        &self,
        request: &WireRequest,
    ) -> std::result::Result<(reqwest::blocking::Response, Duration), Cause> {
        let mut builder = self.client.request(method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            WireBody::Empty => builder,
            WireBody::Bytes(bytes) => builder.body(bytes.clone()),
            WireBody::Multipart { fields, files } => {
                let mut form = reqwest::blocking::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for (name, file) in files {
                    form = form.part(name.clone(), blocking_part(file)?);
                }
                builder.multipart(form)
            }
        };
        let started = Instant::now();
        let response = builder.send().map_err(IntoCause::into_cause)?;
        Ok((response, started.elapsed()))
    }
}

impl HttpEngine for ReqwestEngine {
    type Response = Response;
    type Stream = StreamResponse;

    fn perform(&self, request: &WireRequest) -> std::result::Result<Response, Cause> {
        let (response, elapsed) = self.execute(request)?;
        let status = response.status();
        let headers = header_list(response.headers());
        let content = response.bytes().map_err(IntoCause::into_cause)?.to_vec();
        Ok(Response::new(status.as_u16(), reason(status), headers, elapsed, content))
    }

    fn perform_streaming(&self, request: &WireRequest) -> std::result::Result<StreamResponse, Cause> {
        let (response, elapsed) = self.execute(request)?;
        Ok(StreamResponse::new(response, elapsed))
    }
}

/// reqwest async client behind [`AsyncHttpEngine`]
#[derive(Debug, Clone)]
pub struct AsyncReqwestEngine {
    client: reqwest::Client,
}

impl AsyncReqwestEngine {
    /// Engine with a client configured from `config`
    ///
    /// # Errors
    /// Returns `CourierError::Config` for invalid proxies or TLS setup.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.open_timeout())
            .read_timeout(config.read_timeout())
            .danger_accept_invalid_certs(config.allow_unverified_peer);
        if config.proxies.is_empty() {
            builder = builder.no_proxy();
        }
        for proxy in proxies(config)? {
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(client_error)?;
        Ok(Self { client })
    }

    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(
        &self,
        request: &WireRequest,
    ) -> std::result::Result<(reqwest::Response, Duration), Cause> {
        let mut builder = self.client.request(method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            WireBody::Empty => builder,
            WireBody::Bytes(bytes) => builder.body(bytes.clone()),
            WireBody::Multipart { fields, files } => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for (name, file) in files {
                    form = form.part(name.clone(), async_part(file)?);
                }
                builder.multipart(form)
            }
        };
        let started = Instant::now();
        let response = builder.send().await.map_err(IntoCause::into_cause)?;
        Ok((response, started.elapsed()))
    }
}

#[async_trait]
impl AsyncHttpEngine for AsyncReqwestEngine {
    type Response = Response;
    type Stream = AsyncStreamResponse;

    async fn perform(&self, request: &WireRequest) -> std::result::Result<Response, Cause> {
        let (response, elapsed) = self.execute(request).await?;
        let status = response.status();
        let headers = header_list(response.headers());
        let content = response.bytes().await.map_err(IntoCause::into_cause)?.to_vec();
        Ok(Response::new(status.as_u16(), reason(status), headers, elapsed, content))
    }

    async fn perform_streaming(
        &self,
        request: &WireRequest,
    ) -> std::result::Result<AsyncStreamResponse, Cause> {
        let (response, elapsed) = self.execute(request).await?;
        Ok(AsyncStreamResponse::new(response, elapsed))
    }
}

pub(crate) fn header_list(headers: &HeaderMap) -> HeaderList {
    headers
        .iter()
        .map(|(name, value)| {
            (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect()
}

pub(crate) fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Post => Method::POST,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

fn proxies(config: &TransportConfig) -> Result<Vec<Proxy>> {
    config
        .proxies
        .iter()
        .map(|(key, url)| {
            let proxy = match proxy_scheme(key) {
                Some("http") => Proxy::http(url),
                Some("https") => Proxy::https(url),
                Some(_) => Proxy::all(url),
                None => {
                    return Err(CourierError::Config(format!("Unknown proxy scheme: {key}")));
                }
            };
            proxy.map_err(|err| CourierError::Config(format!("Invalid proxy for {key}: {err}")))
        })
        .collect()
}

fn client_error(err: reqwest::Error) -> CourierError {
    CourierError::Config(format!("Failed to build HTTP client: {err}"))
}

fn blocking_part(
    file: &FilePart,
) -> std::result::Result<reqwest::blocking::multipart::Part, Cause> {
    let mut part = reqwest::blocking::multipart::Part::bytes(file.content.clone());
    if let Some(name) = &file.file_name {
        part = part.file_name(name.clone());
    }
    if let Some(mime) = &file.content_type {
        part = part.mime_str(mime).map_err(IntoCause::into_cause)?;
    }
    Ok(part)
}

fn async_part(file: &FilePart) -> std::result::Result<reqwest::multipart::Part, Cause> {
    let mut part = reqwest::multipart::Part::bytes(file.content.clone());
    if let Some(name) = &file.file_name {
        part = part.file_name(name.clone());
    }
    if let Some(mime) = &file.content_type {
        part = part.mime_str(mime).map_err(IntoCause::into_cause)?;
    }
    Ok(part)
}
