//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Stowage configuration file.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading validates as well
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let connection_string = config.storage.connection_string.expose_secret();
        let scheme = connection_string
            .as_str()
            .split_once("://")
            .map_or("unknown", |(scheme, _)| scheme);

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Storage Scheme: {scheme}");
        match config.storage.request_timeout() {
            Some(timeout) => println!("  Request Timeout: {}s", timeout.as_secs()),
            None => println!("  Request Timeout: disabled"),
        }
        println!("  Create If Absent: {}", config.storage.create_if_absent);
        println!("  Max Batch Size: {}", config.table.max_batch_size);
        println!("  Default Page Size: {}", config.table.default_page_size);
        if config.logging.local_enabled {
            println!(
                "  Log Files: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();
        Ok(EXIT_OK)
    }
}
