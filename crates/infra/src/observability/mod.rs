//! Observability for outgoing requests
//!
//! - [`RequestLogRecord`]: one structured `info!` event per logical send
//! - [`init_tracing`]: subscriber setup for binaries and test harnesses

pub mod request_log;
pub mod tracing_setup;

pub use request_log::RequestLogRecord;
pub use tracing_setup::{init_tracing, LogFormat};
