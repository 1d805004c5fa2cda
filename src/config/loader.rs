// src/config/loader.rs
//! Configuration loading: layered files plus environment overrides
//!
//! Sources merge lowest-to-highest: built-in defaults, the system file under
//! `/etc`, the repo `config/` file, a `weldlog.toml` next to the binary, and
//! finally `WELDLOG_*` environment variables (`WELDLOG_BUS__ADDRESS` sets
//! `bus.address`). An explicitly given path replaces the whole file search
//! and must exist.

use crate::config::constants::paths;
use crate::config::SystemConfig;
use config::{Config, Environment, File};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source file failed to parse or merge
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// The merged configuration failed validation
    #[error("invalid configuration: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Loads and validates [`SystemConfig`]
#[derive(Debug, Default)]
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader using the standard search locations
    pub fn new() -> Self {
        Self {
            explicit_path: None,
        }
    }

    /// Loader reading exactly `path`, which must exist
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            explicit_path: Some(path.into()),
        }
    }

    /// Load, merge, and validate the configuration
    pub fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut builder = Config::builder();

        match &self.explicit_path {
            Some(path) => {
                log::debug!("loading configuration from {}", path.display());
                builder = builder.add_source(File::from(path.clone()));
            }
            None => {
                for path in Self::discover_config_paths() {
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        // Without an explicit prefix separator the config crate reuses the
        // key separator, which would demand `WELDLOG__*` variable names
        let merged = builder
            .add_source(
                Environment::with_prefix(paths::ENV_PREFIX)
                    .prefix_separator(paths::ENV_PREFIX_SEPARATOR)
                    .separator(paths::ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let config: SystemConfig = merged.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(paths::SYSTEM_CONFIG_PATH),
            PathBuf::from(paths::DEFAULT_CONFIG_FILE),
            PathBuf::from(paths::LOCAL_CONFIG_FILE),
        ]
    }
}
