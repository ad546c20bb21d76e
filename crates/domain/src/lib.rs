//! # Courier Domain
//!
//! Value types and the error model for Courier.
//!
//! This crate contains:
//! - Request, sent request and response value types
//! - Headers with sensitivity-aware rendering
//! - Error types and Result definitions
//! - Transport configuration
//!
//! ## Architecture
//! - Depends only on `courier-common` for the retry vocabulary
//! - No I/O: the network engine lives in `courier-infra`

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
