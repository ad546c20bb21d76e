use thiserror::Error;

/// Errors raised while assembling a retry plan
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RetryError {
    /// The retry configuration cannot produce a usable plan
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl RetryError {
    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfiguration { message: message.into() }
    }
}

/// Result type for retry planning
pub type RetryResult<T> = Result<T, RetryError>;
