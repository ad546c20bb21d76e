//! # Courier Infrastructure
//!
//! Network implementations of the `courier-core` ports.
//!
//! This crate contains:
//! - reqwest-backed engines and streamed responses
//! - Retrying sessions driven by the `courier-common` planner
//! - Transports that assemble requests and record what was sent
//! - Configuration loading, request logging and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `courier-core`
//! - Contains all "impure" code (sockets, files, environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod service;

// Re-export commonly used items
pub use errors::{classify, IntoCause};
pub use http::*;
pub use observability::{init_tracing, LogFormat, RequestLogRecord};
pub use service::{async_reqwest_service, reqwest_service, AsyncReqwestService, ReqwestService};
