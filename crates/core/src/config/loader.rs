//! Config path resolution
//!
//! The config file is looked up through an environment variable first and
//! falls back to the working directory.

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "TEASPOON_CONFIG";

/// File name used in the working directory
pub const CONFIG_FILE_NAME: &str = "teaspoon.toml";

/// Returns the config file path.
///
/// Path: `$TEASPOON_CONFIG` when set and non-empty, else
/// `{current_dir}/teaspoon.toml`
pub fn default_config_path() -> ConfigResult<PathBuf> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => {
            let dir = std::env::current_dir().map_err(ConfigError::IoError)?;
            Ok(dir.join(CONFIG_FILE_NAME))
        }
    }
}
