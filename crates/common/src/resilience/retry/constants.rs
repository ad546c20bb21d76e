// Defaults shared by the retry planner and the transport configuration
use std::time::Duration;

use super::kinds::FailureKind;

/// Methods retried by default. POST is left out because it is not idempotent.
pub const DEFAULT_METHODS: [&str; 6] = ["HEAD", "GET", "PUT", "DELETE", "OPTIONS", "TRACE"];

/// Status codes that trigger a retry by default
pub const DEFAULT_STATUS_CODES: [u16; 3] = [413, 429, 503];

/// Default upper bound on the exponential backoff
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Default number of attempts per logical send (including the first)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default backoff factor, in seconds
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.1;

/// Response header that vetoes a retry when set to `true`
pub const DEFAULT_DONT_RETRY_HEADER: &str = "Dont-Retry";

/// Failure kinds absorbed by a non-final attempt by default
pub const DEFAULT_SUPPRESSED_FAILURES: [FailureKind; 2] =
    [FailureKind::Connect, FailureKind::ConnectTimeout];

/// Header consulted for a server-provided backoff
pub const RETRY_AFTER_HEADER: &str = "Retry-After";
