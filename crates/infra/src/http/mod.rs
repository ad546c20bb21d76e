//! HTTP stack: engines, retrying sessions, streamed responses, transports

pub mod engine;
pub mod session;
pub mod stream;
pub mod transport;

pub use engine::{AsyncHttpEngine, AsyncReqwestEngine, HttpEngine, ReqwestEngine, WireBody, WireRequest};
pub use session::{AsyncSession, Session};
pub use stream::{AsyncStreamResponse, Lines, StreamResponse, DEFAULT_CHUNK_SIZE};
pub use transport::{
    AsyncHttpTransport, AsyncReqwestTransport, HttpTransport, ReqwestTransport, RequestAssembler,
    TransportBuilder,
};
