//! Configuration for the reflection kernel
//!
//! Settings live in a single TOML file:
//! - inspector depth limit
//! - default container capacity
//! - what unresolvable references do when they have no context
//! - log level
//!
//! Missing files are created with defaults on first load, and every section
//! falls back to its defaults when absent.
//!
//! # Example
//!
//! ```ignore
//! use teaspoon_core::config::{default_config_path, ReflectConfig};
//!
//! let config = ReflectConfig::load(default_config_path()?)?;
//! teaspoon_core::logging::init(&config);
//!
//! let scope = GenericContainer::from_config(&config.containers);
//! ```

mod loader;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{default_config_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME};

use crate::scope::UnboundPolicy;

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Inspector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Levels printed before the traversal stops
    pub max_depth: usize,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            max_depth: crate::inspect::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Container settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Maximum number of children per container, 0 for unbounded
    pub capacity: usize,
}

impl ContainerConfig {
    /// Capacity limit, `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        (self.capacity > 0).then_some(self.capacity)
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            capacity: crate::scope::DEFAULT_CAPACITY,
        }
    }
}

/// Reference settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Behaviour of a reference resolved without a context
    pub unbound: UnboundPolicy,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,

    pub inspect: InspectConfig,
    pub containers: ContainerConfig,
    pub references: ReferenceConfig,

    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for ReflectConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            log_level: "info".to_string(),
            inspect: InspectConfig::default(),
            containers: ContainerConfig::default(),
            references: ReferenceConfig::default(),
            path: None,
        }
    }
}

impl ReflectConfig {
    /// Load config from `path`, creating a default file if missing
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let mut config = Self::from_toml_str(&content)?;
            config.path = Some(path.to_path_buf());
            tracing::debug!("Loaded config from {:?}", path);
            Ok(config)
        } else {
            let mut config = Self::default();
            config.path = Some(path.to_path_buf());
            config.save()?;
            tracing::info!("Created default config at {:?}", path);
            Ok(config)
        }
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// File this config was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save config to the file it was loaded from
    ///
    /// Configs that were never loaded from disk are written to
    /// [`default_config_path`]. Creates parent directories if needed.
    pub fn save(&self) -> ConfigResult<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        self.save_to(&path)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reload config from its file
    ///
    /// Updates self with the current file contents.
    pub fn reload(&mut self) -> ConfigResult<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let content = std::fs::read_to_string(&path)?;
        *self = Self::from_toml_str(&content)?;
        self.path = Some(path);
        tracing::debug!("Reloaded config from {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("teaspoon-config-{}-{}", std::process::id(), id))
            .join(name)
    }

    #[test]
    fn test_config_default() {
        let config = ReflectConfig::default();
        assert_eq!(config.version, 1);
        assert!(!config.debug);
        assert_eq!(config.inspect.max_depth, 10);
        assert_eq!(config.containers.limit(), Some(256));
        assert_eq!(config.references.unbound, UnboundPolicy::Retry);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ReflectConfig::from_toml_str(
            r#"
            debug = true

            [references]
            unbound = "abandon"
            "#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(config.version, 1);
        assert_eq!(config.inspect.max_depth, 10);
        assert_eq!(config.references.unbound, UnboundPolicy::Abandon);
    }

    #[test]
    fn test_unbounded_containers() {
        let config = ReflectConfig::from_toml_str("[containers]\n").unwrap();
        assert_eq!(config.containers.limit(), Some(256));

        let config = ReflectConfig::from_toml_str("[containers]\ncapacity = 0\n").unwrap();
        assert_eq!(config.containers.limit(), None);
    }

    #[test]
    fn test_invalid_toml() {
        let result = ReflectConfig::from_toml_str("inspect = 3");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_serialize() {
        let mut config = ReflectConfig::default();
        config.version = 2;
        config.inspect.max_depth = 4;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 2"));
        assert!(toml_str.contains("max_depth = 4"));
        assert!(toml_str.contains("unbound = \"retry\""));
    }

    #[test]
    fn test_load_creates_default_file() {
        let path = temp_path("teaspoon.toml");
        assert!(!path.exists());

        let config = ReflectConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, ReflectConfig::load(&path).unwrap());
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("teaspoon.toml");
        let mut config = ReflectConfig::load(&path).unwrap();

        let mut edited = config.clone();
        edited.inspect.max_depth = 3;
        edited.references.unbound = UnboundPolicy::Abandon;
        edited.save().unwrap();

        config.reload().unwrap();
        assert_eq!(config.inspect.max_depth, 3);
        assert_eq!(config.references.unbound, UnboundPolicy::Abandon);
        assert_eq!(config.path(), Some(path.as_path()));
    }
}
