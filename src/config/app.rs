//! Application configuration structures.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::probe::EndpointSpec;

use super::endpoint::EndpointConfig;
use super::validation::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Default database file.
pub const DEFAULT_DB_PATH: &str = "pingpal.db";

/// Default writer channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path (default: "pingpal.db").
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// MPSC channel capacity for write operations (default: 1024).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Endpoints to monitor, in file order.
    pub endpoints: Vec<EndpointConfig>,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "database channel_capacity must be positive".to_string(),
            ));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "database path cannot be empty".to_string(),
            ));
        }

        let specs = self.to_endpoint_specs()?;
        for spec in &specs {
            if spec.timeout > spec.interval {
                tracing::warn!(
                    endpoint = %spec.name,
                    timeout = %humantime::format_duration(spec.timeout),
                    interval = %humantime::format_duration(spec.interval),
                    "Timeout exceeds interval"
                );
            }
        }

        Ok(())
    }

    /// Convert endpoint entries into validated specs, preserving order.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` on the first invalid entry or a
    /// duplicate name.
    pub fn to_endpoint_specs(&self) -> Result<Vec<EndpointSpec>, ConfigError> {
        let mut seen_names = HashSet::new();
        let mut specs = Vec::with_capacity(self.endpoints.len());

        for (index, entry) in self.endpoints.iter().enumerate() {
            let spec = entry.to_spec(index).map_err(ConfigError::Validation)?;
            if !seen_names.insert(spec.name.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate endpoint name: '{}'",
                    spec.name
                )));
            }
            specs.push(spec);
        }

        Ok(specs)
    }
}
