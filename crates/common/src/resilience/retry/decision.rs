use std::time::Duration;

/// Plan for a single attempt, computed by the
/// [`RetryManager`](super::RetryManager) before the attempt runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryDecision {
    /// 1-based attempt index
    pub attempt: u32,
    /// Whether this is the last attempt allowed for the method. A last
    /// attempt never suppresses anything.
    pub is_last: bool,
    /// Exponential backoff to wait after this attempt if it is retried
    pub backoff: Duration,
}

impl RetryDecision {
    /// Create a decision for the given attempt
    pub const fn new(attempt: u32, is_last: bool, backoff: Duration) -> Self {
        Self { attempt, is_last, backoff }
    }
}
