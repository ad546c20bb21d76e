//! # Courier Core
//!
//! Service layer and transport ports - no network code.
//!
//! This crate contains:
//! - Port interfaces for blocking and cooperative transports
//! - The service layer that maps transport outcomes onto the error model
//!
//! ## Architecture Principles
//! - Depends on `courier-common` and `courier-domain` only
//! - The network engine is reached through the traits in [`transport`]

pub mod service;
pub mod transport;

pub use service::{suppress_http_error, AsyncService, RequestOptions, Service};
pub use transport::{AsyncStreamingResponse, AsyncTransport, BlockingTransport, StreamingResponse};
