//! Configuration schema types
//!
//! This module defines the configuration structure of `stowage.toml`.

use crate::config::SecretString;
use crate::core::table::MAX_BATCH_SIZE;
use crate::domain::query::MAX_PAGE_SIZE;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main Stowage configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StowageConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Storage connection settings
    pub storage: StorageConfig,

    /// Table client settings
    #[serde(default)]
    pub table: TableConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StowageConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.storage.validate()?;
        self.table.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Storage connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Connection string (`memory://` or `file:///path/to/store.json`)
    /// Stored securely in memory and automatically zeroized on drop
    pub connection_string: SecretString,

    /// Deadline of a single backend call in seconds; 0 disables it
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Create missing containers and tables on first use
    #[serde(default)]
    pub create_if_absent: bool,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.connection_string.expose_secret().as_str().trim().is_empty() {
            return Err("storage.connection_string cannot be empty".to_string());
        }

        if self.request_timeout_seconds > 3600 {
            return Err("storage.request_timeout_seconds must be <= 3600".to_string());
        }

        Ok(())
    }

    /// Per-call deadline, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }
}

/// Table client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Operations per submitted batch chunk (1-100)
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Entities per query segment when the caller does not choose (1-1000)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            default_page_size: default_page_size(),
        }
    }
}

impl TableConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(format!(
                "table.max_batch_size must be between 1 and {MAX_BATCH_SIZE}"
            ));
        }

        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "table.default_page_size must be between 1 and {MAX_PAGE_SIZE}"
            ));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_page_size() -> usize {
    100
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
