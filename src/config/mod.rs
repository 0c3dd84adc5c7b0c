//! Configuration management for Stowage.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `STOWAGE_*`
//! environment overrides, defaults for optional settings and validation on
//! load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stowage::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("stowage.toml")?;
//! println!("Batch size: {}", config.table.max_batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`StorageConfig`] - Connection string, request timeout, create-if-absent
//! - [`TableConfig`] - Batch chunk size and default page size
//! - [`LoggingConfig`] - Optional rolling JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [storage]
//! connection_string = "${STOWAGE_CONNECTION}"
//! request_timeout_seconds = 30
//! create_if_absent = true
//!
//! [table]
//! max_batch_size = 100
//! default_page_size = 100
//!
//! [logging]
//! local_enabled = false
//! local_path = "./logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config, DEFAULT_CONFIG_FILE};
pub use schema::{ApplicationConfig, LoggingConfig, StorageConfig, StowageConfig, TableConfig};
pub use secret::{secret_string, SecretString, SecretValue};
