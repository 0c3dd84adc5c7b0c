//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "stowage.toml")]
    pub output: String,

    /// Include comments explaining every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Stowage configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Point storage.connection_string at your store");
                println!("  2. Validate configuration: stowage validate-config");
                println!("  3. Try it: stowage table import <TABLE> <FILE.json>");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Stowage Configuration File

[application]
log_level = "info"

[storage]
connection_string = "file:///tmp/stowage/store.json"
request_timeout_seconds = 30
create_if_absent = true

[table]
max_batch_size = 100
default_page_size = 100

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with comments
    fn generate_config_with_examples() -> String {
        r#"# Stowage Configuration File
#
# Values may reference environment variables as ${VAR_NAME}. Any setting can
# also be overridden with STOWAGE_<SECTION>_<KEY>, for example
# STOWAGE_STORAGE_CONNECTION_STRING.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Storage Connection
# ============================================================================
[storage]
# memory://                     volatile store, lost on exit
# file:///abs/path/store.json   store persisted to a JSON snapshot
connection_string = "${STOWAGE_CONNECTION}"

# Deadline of a single backend call in seconds (0 disables, max 3600)
request_timeout_seconds = 30

# Create missing containers and tables on first use
create_if_absent = true

# ============================================================================
# Table Settings
# ============================================================================
[table]
# Operations per batch chunk (1-100)
max_batch_size = 100

# Entities per query page when --page-size is not given (1-1000)
default_page_size = 100

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Write JSON log files in addition to console output
local_enabled = false

# Log directory
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}
