//! Testing utilities and helpers
//!
//! - **[`mocks`]**: mock responses, failures and scripted attempt outcomes
//!
//! Enable the `test-utils` feature to use these from another crate's tests.

pub mod mocks;

pub use mocks::{AttemptScript, MockFailure, MockResponse};
