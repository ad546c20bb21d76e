//! Transport configuration
//!
//! Every field has a default, so partial TOML/JSON documents and partial
//! environment overrides are valid.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use courier_common::resilience::retry::{
    RetryManager, DEFAULT_BACKOFF_FACTOR, DEFAULT_DONT_RETRY_HEADER, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_METHODS, DEFAULT_STATUS_CODES, DEFAULT_SUPPRESSED_FAILURES,
};
use serde::{Deserialize, Serialize};

use crate::errors::{CourierError, Result};
use crate::types::HttpMethod;

pub const DEFAULT_TIMEOUT_IN_SECONDS: f64 = 1.0;
pub const DEFAULT_BACKOFF_MAX_IN_SECONDS: f64 = 120.0;

/// Proxy keys understood by the transport
const PROXY_SCHEMES: [&str; 3] = ["http", "https", "all"];

/// Settings for one transport instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Skip TLS certificate verification
    pub allow_unverified_peer: bool,
    pub open_timeout_in_seconds: f64,
    pub read_timeout_in_seconds: f64,
    /// Attempts per logical send, first one included
    pub retry_max_attempts: u32,
    pub retry_backoff_factor: f64,
    pub retry_backoff_max: f64,
    /// Add POST to the retryable methods
    pub allow_post_retry: bool,
    pub retry_status_codes: BTreeSet<u16>,
    /// Scheme (`http`, `https`, `all`, optionally with `://`) to proxy URL
    pub proxies: BTreeMap<String, String>,
    pub dont_retry_header_names: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            allow_unverified_peer: false,
            open_timeout_in_seconds: DEFAULT_TIMEOUT_IN_SECONDS,
            read_timeout_in_seconds: DEFAULT_TIMEOUT_IN_SECONDS,
            retry_max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_factor: DEFAULT_BACKOFF_FACTOR,
            retry_backoff_max: DEFAULT_BACKOFF_MAX_IN_SECONDS,
            allow_post_retry: false,
            retry_status_codes: DEFAULT_STATUS_CODES.into_iter().collect(),
            proxies: BTreeMap::new(),
            dont_retry_header_names: vec![DEFAULT_DONT_RETRY_HEADER.to_string()],
        }
    }
}

impl TransportConfig {
    /// Check the configuration can build a transport
    ///
    /// # Errors
    /// Returns `CourierError::Config` if:
    /// - `retry_max_attempts` is 0
    /// - a timeout or backoff setting is negative, NaN or infinite
    /// - a timeout is too large to be used as a deadline
    /// - a proxy key is not a known scheme or its URL is empty
    pub fn validate(&self) -> Result<()> {
        if self.retry_max_attempts == 0 {
            return Err(CourierError::Config("retry_max_attempts must be at least 1".into()));
        }

        for (name, value) in [
            ("open_timeout_in_seconds", self.open_timeout_in_seconds),
            ("read_timeout_in_seconds", self.read_timeout_in_seconds),
            ("retry_backoff_factor", self.retry_backoff_factor),
            ("retry_backoff_max", self.retry_backoff_max),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CourierError::Config(format!(
                    "{name} must be a finite, non-negative number, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("open_timeout_in_seconds", self.open_timeout_in_seconds),
            ("read_timeout_in_seconds", self.read_timeout_in_seconds),
        ] {
            if Instant::now().checked_add(seconds(value)).is_none() {
                return Err(CourierError::Config(format!(
                    "{name} is too large to use as a timeout, got {value}"
                )));
            }
        }

        for (scheme, url) in &self.proxies {
            if proxy_scheme(scheme).is_none() {
                return Err(CourierError::Config(format!("Unknown proxy scheme: {scheme}")));
            }
            if url.trim().is_empty() {
                return Err(CourierError::Config(format!("Empty proxy URL for {scheme}")));
            }
        }

        Ok(())
    }

    pub fn open_timeout(&self) -> Duration {
        seconds(self.open_timeout_in_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        seconds(self.read_timeout_in_seconds)
    }

    pub fn backoff_max(&self) -> Duration {
        seconds(self.retry_backoff_max)
    }

    /// Methods that get more than one attempt
    pub fn retry_methods(&self) -> BTreeSet<String> {
        let mut methods: BTreeSet<String> =
            DEFAULT_METHODS.iter().map(|m| (*m).to_string()).collect();
        if self.allow_post_retry {
            methods.insert(HttpMethod::Post.as_str().to_string());
        }
        methods
    }

    /// Build the attempt planner described by this configuration
    ///
    /// # Errors
    /// Returns `CourierError::Config` if validation fails.
    pub fn retry_manager(&self) -> Result<RetryManager> {
        self.validate()?;
        RetryManager::builder()
            .max_attempts(self.retry_max_attempts)
            .backoff_factor(self.retry_backoff_factor)
            .backoff_max(self.backoff_max())
            .allowed_methods(self.retry_methods())
            .status_codes(self.retry_status_codes.iter().copied())
            .suppressed_failures(DEFAULT_SUPPRESSED_FAILURES)
            .dont_retry_header_names(self.dont_retry_header_names.iter().cloned())
            .build()
            .map_err(|e| CourierError::Config(e.to_string()))
    }
}

/// Normalize a proxy key (`"https"`, `"https://"`, `"ALL"`) to its scheme
pub fn proxy_scheme(key: &str) -> Option<&'static str> {
    let key = key.trim().trim_end_matches("://");
    PROXY_SCHEMES.into_iter().find(|scheme| scheme.eq_ignore_ascii_case(key))
}

// Finite, non-negative values only. Values past `Duration::MAX` saturate,
// so a huge backoff ceiling means "no ceiling".
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TransportConfig::default();

        assert!(!config.allow_unverified_peer);
        assert_eq!(config.open_timeout(), Duration::from_secs(1));
        assert_eq!(config.read_timeout(), Duration::from_secs(1));
        assert_eq!(config.retry_max_attempts, 10);
        assert!((config.retry_backoff_factor - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.backoff_max(), Duration::from_secs(120));
        assert_eq!(config.retry_status_codes, [413, 429, 503].into_iter().collect());
        assert!(config.proxies.is_empty());
        assert_eq!(config.dont_retry_header_names, vec!["Dont-Retry".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_attempts_fail_validation() {
        let config = TransportConfig { retry_max_attempts: 0, ..TransportConfig::default() };

        assert!(matches!(config.validate(), Err(CourierError::Config(_))));
        assert!(config.retry_manager().is_err());
    }

    #[test]
    fn negative_timeout_fails_validation() {
        let config = TransportConfig { read_timeout_in_seconds: -1.0, ..TransportConfig::default() };
        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("read_timeout_in_seconds"));
    }

    #[test]
    fn huge_backoff_max_saturates_instead_of_vanishing() {
        let config = TransportConfig { retry_backoff_max: 1e20, ..TransportConfig::default() };

        assert!(config.validate().is_ok());
        assert_eq!(config.backoff_max(), Duration::MAX);

        let manager = config.retry_manager().unwrap();
        assert!(manager.backoff_for(1) > Duration::ZERO);
        assert!(manager.backoff_for(5) > Duration::from_secs(1));
        assert!(manager.backoff_for(5) < Duration::from_secs(2));
    }

    #[test]
    fn large_representable_backoff_max_is_kept() {
        let config = TransportConfig { retry_backoff_max: 1e12, ..TransportConfig::default() };

        assert_eq!(config.backoff_max(), Duration::from_secs(1_000_000_000_000));
    }

    #[test]
    fn timeout_beyond_any_deadline_fails_validation() {
        for config in [
            TransportConfig { open_timeout_in_seconds: 1e20, ..TransportConfig::default() },
            TransportConfig { read_timeout_in_seconds: 1e19, ..TransportConfig::default() },
        ] {
            let err = config.validate().unwrap_err();

            assert!(err.to_string().contains("too large"));
            assert!(config.retry_manager().is_err());
        }
    }

    #[test]
    fn unknown_proxy_scheme_fails_validation() {
        let mut config = TransportConfig::default();
        config.proxies.insert("socks".into(), "socks5://proxy".into());

        assert!(config.validate().is_err());
    }

    #[test]
    fn proxy_keys_accept_url_prefix_form() {
        assert_eq!(proxy_scheme("http"), Some("http"));
        assert_eq!(proxy_scheme("https://"), Some("https"));
        assert_eq!(proxy_scheme("ALL"), Some("all"));
        assert_eq!(proxy_scheme("ftp://"), None);
    }

    #[test]
    fn post_retry_adds_post() {
        let config = TransportConfig { allow_post_retry: true, ..TransportConfig::default() };
        let manager = config.retry_manager().unwrap();

        assert_eq!(manager.attempts_for("POST"), 10);
        assert_eq!(TransportConfig::default().retry_manager().unwrap().attempts_for("POST"), 1);
    }

    #[test]
    fn retry_manager_carries_status_codes() {
        let config =
            TransportConfig { retry_status_codes: BTreeSet::new(), ..TransportConfig::default() };
        let manager = config.retry_manager().unwrap();

        assert!(manager.rules().status_codes.is_empty());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"retry_max_attempts": 3, "allow_post_retry": true}"#)
                .unwrap();

        assert_eq!(config.retry_max_attempts, 3);
        assert!(config.allow_post_retry);
        assert_eq!(config.read_timeout(), Duration::from_secs(1));
    }
}
