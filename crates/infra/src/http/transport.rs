//! Transports: request assembly on top of a retrying session
//!
//! A transport turns a domain [`Request`] into a [`WireRequest`] plus the
//! [`SentRequest`] record, logs it, hands it to the session, and attaches
//! the record to any final failure.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use courier_core::{AsyncStreamingResponse, AsyncTransport, BlockingTransport, StreamingResponse};
use courier_domain::constants::{APPLICATION_JSON, CONTENT_TYPE, MULTIPART_BODY_FIELD};
use courier_domain::{
    default_json_encoder, CourierError, Header, JsonEncoder, Request, Response, Result,
    SentRequest, TransportConfig, TransportError,
};
use url::Url;

use super::engine::{
    AsyncHttpEngine, AsyncReqwestEngine, HttpEngine, ReqwestEngine, WireBody, WireRequest,
};
use super::session::{AsyncSession, Session};
use crate::observability::RequestLogRecord;

/// Builds wire requests and their sent records
#[derive(Clone)]
pub struct RequestAssembler {
    base_url: String,
    proxies: BTreeMap<String, String>,
    json_encoder: JsonEncoder,
}

impl RequestAssembler {
    pub fn new(
        base_url: impl Into<String>,
        proxies: BTreeMap<String, String>,
        json_encoder: JsonEncoder,
    ) -> Self {
        Self { base_url: base_url.into(), proxies, json_encoder }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Negotiate the body and headers of `request`.
    ///
    /// - JSON with files, or JSON with a raw body, is rejected
    /// - files go out as multipart, a raw body riding along as field `data`
    /// - JSON is encoded and labelled `application/json`
    /// - otherwise the raw body, if any, is sent as-is
    ///
    /// # Errors
    /// Returns `JsonWithFiles`, `JsonWithBody` or `Encode`.
    pub fn prepare(
        &self,
        request: &Request,
    ) -> std::result::Result<(WireRequest, SentRequest), TransportError> {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut captured = None;

        let body = match (request.json_payload(), request.files(), request.raw_body()) {
            (Some(_), Some(_), _) => return Err(TransportError::JsonWithFiles),
            (Some(_), None, Some(_)) => return Err(TransportError::JsonWithBody),
            (Some(json), None, None) => {
                let text = (self.json_encoder)(json)
                    .map_err(|e| TransportError::Encode(e.to_string()))?;
                headers.push((CONTENT_TYPE.to_ascii_lowercase(), APPLICATION_JSON.to_string()));
                captured = Some(text.clone().into_bytes());
                WireBody::Bytes(text.into_bytes())
            }
            (None, Some(files), body) => WireBody::Multipart {
                fields: body
                    .map(|body| vec![(MULTIPART_BODY_FIELD.to_string(), body.to_text())])
                    .unwrap_or_default(),
                files: files.to_vec(),
            },
            (None, None, Some(body)) => {
                captured = Some(body.as_bytes().to_vec());
                WireBody::Bytes(body.as_bytes().to_vec())
            }
            (None, None, None) => WireBody::Empty,
        };

        let sensitive: HashSet<String> = request
            .headers()
            .iter()
            .filter(|h| h.is_sensitive())
            .map(|h| h.name().to_ascii_lowercase())
            .collect();
        headers.extend(
            request.headers().iter().map(|h| (h.name().to_ascii_lowercase(), h.value().to_string())),
        );

        let url = request.build_absolute_url(&self.base_url);
        let sent = SentRequest::new(
            request.method(),
            url.clone(),
            headers
                .iter()
                .map(|(name, value)| {
                    Header::with_sensitivity(name.clone(), value.clone(), sensitive.contains(name))
                })
                .collect(),
            captured,
            self.proxies.clone(),
        );
        let wire = WireRequest { method: request.method(), url, headers, body };
        Ok((wire, sent))
    }
}

impl std::fmt::Debug for RequestAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAssembler")
            .field("base_url", &self.base_url)
            .field("proxies", &self.proxies)
            .finish_non_exhaustive()
    }
}

/// Blocking transport over any [`HttpEngine`]
#[derive(Debug)]
pub struct HttpTransport<E> {
    assembler: RequestAssembler,
    session: Session<E>,
}

/// Blocking transport backed by reqwest
pub type ReqwestTransport = HttpTransport<ReqwestEngine>;

impl<E: HttpEngine> HttpTransport<E> {
    pub const fn new(assembler: RequestAssembler, session: Session<E>) -> Self {
        Self { assembler, session }
    }

    pub const fn assembler(&self) -> &RequestAssembler {
        &self.assembler
    }

    pub const fn session(&self) -> &Session<E> {
        &self.session
    }
}

impl<E> BlockingTransport for HttpTransport<E>
where
    E: HttpEngine<Response = Response>,
    E::Stream: StreamingResponse,
{
    type Stream = E::Stream;

    fn send(&self, request: &Request) -> std::result::Result<(SentRequest, Response), TransportError> {
        let (wire, sent) = self.assembler.prepare(request)?;
        RequestLogRecord::new(&sent).emit();
        match self.session.send(&wire) {
            Ok(response) => Ok((sent, response)),
            Err(cause) => Err(TransportError::failed(sent, cause)),
        }
    }

    fn stream(
        &self,
        request: &Request,
    ) -> std::result::Result<(SentRequest, E::Stream), TransportError> {
        let (wire, sent) = self.assembler.prepare(request)?;
        RequestLogRecord::new(&sent).emit();
        match self.session.stream(&wire) {
            Ok(stream) => Ok((sent, stream)),
            Err(cause) => Err(TransportError::failed(sent, cause)),
        }
    }
}

/// Cooperative transport over any [`AsyncHttpEngine`]
#[derive(Debug)]
pub struct AsyncHttpTransport<E> {
    assembler: RequestAssembler,
    session: AsyncSession<E>,
}

/// Cooperative transport backed by reqwest
pub type AsyncReqwestTransport = AsyncHttpTransport<AsyncReqwestEngine>;

impl<E: AsyncHttpEngine> AsyncHttpTransport<E> {
    pub const fn new(assembler: RequestAssembler, session: AsyncSession<E>) -> Self {
        Self { assembler, session }
    }

    pub const fn assembler(&self) -> &RequestAssembler {
        &self.assembler
    }

    pub const fn session(&self) -> &AsyncSession<E> {
        &self.session
    }
}

#[async_trait]
impl<E> AsyncTransport for AsyncHttpTransport<E>
where
    E: AsyncHttpEngine<Response = Response>,
    E::Stream: AsyncStreamingResponse,
{
    type Stream = E::Stream;

    async fn send(
        &self,
        request: &Request,
    ) -> std::result::Result<(SentRequest, Response), TransportError> {
        let (wire, sent) = self.assembler.prepare(request)?;
        RequestLogRecord::new(&sent).emit();
        match self.session.send(&wire).await {
            Ok(response) => Ok((sent, response)),
            Err(cause) => Err(TransportError::failed(sent, cause)),
        }
    }

    async fn stream(
        &self,
        request: &Request,
    ) -> std::result::Result<(SentRequest, E::Stream), TransportError> {
        let (wire, sent) = self.assembler.prepare(request)?;
        RequestLogRecord::new(&sent).emit();
        match self.session.stream(&wire).await {
            Ok(stream) => Ok((sent, stream)),
            Err(cause) => Err(TransportError::failed(sent, cause)),
        }
    }
}

/// Builder for the reqwest-backed transports
#[derive(Clone)]
pub struct TransportBuilder {
    base_url: String,
    config: TransportConfig,
    json_encoder: JsonEncoder,
}

impl TransportBuilder {
    /// Builder for `base_url` with the default configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            config: TransportConfig::default(),
            json_encoder: default_json_encoder(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the JSON body encoder
    #[must_use]
    pub fn json_encoder(mut self, encoder: JsonEncoder) -> Self {
        self.json_encoder = encoder;
        self
    }

    /// # Errors
    /// Returns `CourierError::Config` for an invalid base URL or configuration.
    pub fn build_blocking(self) -> Result<ReqwestTransport> {
        let retries = self.config.retry_manager()?;
        let engine = ReqwestEngine::new(&self.config)?;
        let assembler = self.assembler()?;
        Ok(HttpTransport::new(assembler, Session::new(engine, retries)))
    }

    /// # Errors
    /// Returns `CourierError::Config` for an invalid base URL or configuration.
    pub fn build_async(self) -> Result<AsyncReqwestTransport> {
        let retries = self.config.retry_manager()?;
        let engine = AsyncReqwestEngine::new(&self.config)?;
        let assembler = self.assembler()?;
        Ok(AsyncHttpTransport::new(assembler, AsyncSession::new(engine, retries)))
    }

    fn assembler(self) -> Result<RequestAssembler> {
        Url::parse(&self.base_url)
            .map_err(|e| CourierError::Config(format!("Invalid base URL {}: {e}", self.base_url)))?;
        Ok(RequestAssembler::new(self.base_url, self.config.proxies, self.json_encoder))
    }
}

impl std::fmt::Debug for TransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportBuilder")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
