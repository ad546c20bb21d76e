//! `Retry-After` header parsing.
//!
//! The header carries either a number of seconds or an HTTP-date. Anything
//! that cannot be read as one of those yields a zero backoff, which leaves the
//! exponential backoff of the guard in force.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

const RFC_850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Parse a `Retry-After` value relative to the current time.
pub fn parse_retry_after(value: &str) -> Duration {
    parse_retry_after_at(value, Utc::now())
}

/// Parse a `Retry-After` value relative to `now`.
///
/// - digits only (surrounding whitespace allowed): that many seconds,
///   saturating at `u64::MAX`
/// - an HTTP-date: the time left until that date, zero if it has passed
/// - anything else, including an empty value: zero
pub fn parse_retry_after_at(value: &str, now: DateTime<Utc>) -> Duration {
    let value = value.trim();
    if value.is_empty() {
        return Duration::ZERO;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        // All digits, so parsing can only fail on overflow
        let seconds = value.parse::<u64>().unwrap_or(u64::MAX);
        return Duration::from_secs(seconds);
    }

    parse_http_date(value)
        .and_then(|at| (at - now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, RFC_850_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, ASCTIME_FORMAT))
        .ok()
        .map(|naive| naive.and_utc())
}
