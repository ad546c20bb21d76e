//! Subscriber setup
//!
//! The filter comes from `RUST_LOG` when set, `info,courier=debug`
//! otherwise. Installing twice is not an error: the first subscriber wins.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,courier=debug";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, for terminals
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install a global `fmt` subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
