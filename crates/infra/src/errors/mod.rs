//! Engine error classification

pub mod conversions;

pub use conversions::{classify, IntoCause};
