//! Configuration loading
//!
//! Builds a [`TransportConfig`](courier_domain::TransportConfig) from files
//! and `COURIER_*` environment variables.

pub mod loader;

pub use loader::{
    apply_env_overrides, load, load_from_env, load_from_file, parse_config, probe_config_paths,
};
