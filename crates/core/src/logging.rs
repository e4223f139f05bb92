//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the config's `log_level` is used,
//! raised to `debug` when `debug = true`.

use tracing_subscriber::EnvFilter;

use crate::config::ReflectConfig;

/// Filter directive derived from the config
pub fn filter_directive(config: &ReflectConfig) -> &str {
    if config.debug {
        "debug"
    } else {
        &config.log_level
    }
}

/// Install a global fmt subscriber
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &ReflectConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(config)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
