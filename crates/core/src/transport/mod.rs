//! Transport boundary

pub mod ports;

pub use ports::{AsyncStreamingResponse, AsyncTransport, BlockingTransport, StreamingResponse};
