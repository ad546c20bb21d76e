//! Transport configuration loader
//!
//! ## Loading Strategy
//! 1. Start from the file at the given path, the first probed file, or the
//!    defaults when neither exists
//! 2. Layer `COURIER_*` environment variables on top
//! 3. Validate the result
//!
//! ## Environment Variables
//! - `COURIER_ALLOW_UNVERIFIED_PEER`: skip TLS verification (true/false)
//! - `COURIER_OPEN_TIMEOUT`: connect timeout in seconds
//! - `COURIER_READ_TIMEOUT`: read timeout in seconds
//! - `COURIER_RETRY_MAX_ATTEMPTS`: attempts per logical send
//! - `COURIER_RETRY_BACKOFF_FACTOR`: backoff base in seconds
//! - `COURIER_RETRY_BACKOFF_MAX`: backoff ceiling in seconds
//! - `COURIER_ALLOW_POST_RETRY`: retry POST too (true/false)
//! - `COURIER_RETRY_STATUS_CODES`: comma separated statuses, empty for none
//! - `COURIER_DONT_RETRY_HEADERS`: comma separated header names
//! - `COURIER_HTTP_PROXY`, `COURIER_HTTPS_PROXY`, `COURIER_ALL_PROXY`
//!
//! ## File Locations
//! `./courier.toml`, then `./courier.json`, in the working directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use courier_domain::{CourierError, Result, TransportConfig};

const PROXY_VARS: [(&str, &str); 3] = [
    ("COURIER_HTTP_PROXY", "http"),
    ("COURIER_HTTPS_PROXY", "https"),
    ("COURIER_ALL_PROXY", "all"),
];

/// Load the effective configuration
///
/// # Errors
/// Returns `CourierError::Config` if the file cannot be read or parsed, an
/// environment variable holds an invalid value, or validation fails.
pub fn load(path: Option<&Path>) -> Result<TransportConfig> {
    let base = match path.map(Path::to_path_buf).or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::debug!("No config file found, using defaults");
            TransportConfig::default()
        }
    };
    let config = apply_env_overrides(base, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Defaults with environment overrides applied
///
/// # Errors
/// Returns `CourierError::Config` for unparsable values.
pub fn load_from_env() -> Result<TransportConfig> {
    apply_env_overrides(TransportConfig::default(), |key| std::env::var(key).ok())
}

/// Load a TOML or JSON file, chosen by extension
///
/// # Errors
/// Returns `CourierError::Config` if the file is missing, unreadable, or
/// not valid for its format.
pub fn load_from_file(path: &Path) -> Result<TransportConfig> {
    if !path.exists() {
        return Err(CourierError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading transport configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| CourierError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse `contents` in the format named by `path`'s extension
///
/// # Errors
/// Returns `CourierError::Config` if the format is unsupported or parsing
/// fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<TransportConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CourierError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CourierError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CourierError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working directory
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    [cwd.join("courier.toml"), cwd.join("courier.json")].into_iter().find(|path| path.exists())
}

/// Layer variables from `lookup` over `config`. Unset variables leave the
/// field alone.
///
/// # Errors
/// Returns `CourierError::Config` naming the first unparsable variable.
pub fn apply_env_overrides<F>(mut config: TransportConfig, lookup: F) -> Result<TransportConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("COURIER_ALLOW_UNVERIFIED_PEER") {
        config.allow_unverified_peer = parse_bool("COURIER_ALLOW_UNVERIFIED_PEER", &value)?;
    }
    if let Some(value) = lookup("COURIER_OPEN_TIMEOUT") {
        config.open_timeout_in_seconds = parse_value("COURIER_OPEN_TIMEOUT", &value)?;
    }
    if let Some(value) = lookup("COURIER_READ_TIMEOUT") {
        config.read_timeout_in_seconds = parse_value("COURIER_READ_TIMEOUT", &value)?;
    }
    if let Some(value) = lookup("COURIER_RETRY_MAX_ATTEMPTS") {
        config.retry_max_attempts = parse_value("COURIER_RETRY_MAX_ATTEMPTS", &value)?;
    }
    if let Some(value) = lookup("COURIER_RETRY_BACKOFF_FACTOR") {
        config.retry_backoff_factor = parse_value("COURIER_RETRY_BACKOFF_FACTOR", &value)?;
    }
    if let Some(value) = lookup("COURIER_RETRY_BACKOFF_MAX") {
        config.retry_backoff_max = parse_value("COURIER_RETRY_BACKOFF_MAX", &value)?;
    }
    if let Some(value) = lookup("COURIER_ALLOW_POST_RETRY") {
        config.allow_post_retry = parse_bool("COURIER_ALLOW_POST_RETRY", &value)?;
    }
    if let Some(value) = lookup("COURIER_RETRY_STATUS_CODES") {
        config.retry_status_codes = split_list(&value)
            .map(|code| parse_value("COURIER_RETRY_STATUS_CODES", code))
            .collect::<Result<_>>()?;
    }
    if let Some(value) = lookup("COURIER_DONT_RETRY_HEADERS") {
        config.dont_retry_header_names = split_list(&value).map(str::to_string).collect();
    }
    for (var, scheme) in PROXY_VARS {
        if let Some(url) = lookup(var).filter(|url| !url.trim().is_empty()) {
            config.proxies.insert(scheme.to_string(), url.trim().to_string());
        }
    }
    Ok(config)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CourierError::Config(format!("Invalid value for {key}: {value:?} ({e})")))
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CourierError::Config(format!("Invalid boolean for {key}: {value:?}"))),
    }
}
