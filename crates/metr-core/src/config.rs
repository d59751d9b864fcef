//! Configuration management for metr
//!
//! Holds the process-wide switches (failure propagation, correlation id)
//! and the defaults used by the bundled SQL and logging sinks.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{settings, MetrError, Result};

/// metr configuration
///
/// Loaded from `.metr/config.toml` under a root directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetrConfig {
    /// Return handler failures to the recording caller instead of logging them
    #[serde(default)]
    pub propagate_exceptions: bool,

    /// Fixed correlation id; generated per process when absent
    #[serde(default)]
    pub ray_id: Option<String>,

    /// SQL sink settings
    #[serde(default)]
    pub sql: SqlConfig,

    /// Logging sink settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SQL sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlConfig {
    /// Table receiving one row per record
    #[serde(default = "default_table")]
    pub table: String,
}

/// Logging sink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing level name (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_level")]
    pub level: String,

    /// Logical logger name attached to every emitted event
    #[serde(default = "default_logger_name")]
    pub name: String,
}

// Default value providers
fn default_table() -> String {
    "metrics".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_logger_name() -> String {
    "metrics".to_string()
}

impl MetrConfig {
    /// Load configuration from `.metr/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(".metr/config.toml");

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| MetrError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Write default configuration to `.metr/config.toml`
    pub fn write_default(root: &Path) -> Result<()> {
        let config_dir = root.join(".metr");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| MetrError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Push the process-wide switches into [`settings`]
    pub fn apply(&self) {
        settings::set_propagate_exceptions(self.propagate_exceptions);
        if let Some(ray_id) = &self.ray_id {
            settings::set_ray_id(ray_id.clone());
        }
    }
}

impl Default for MetrConfig {
    fn default() -> Self {
        Self {
            propagate_exceptions: false,
            ray_id: None,
            sql: SqlConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            name: default_logger_name(),
        }
    }
}
