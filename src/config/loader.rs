//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::StowageConfig;
use super::secret::secret_string;
use crate::domain::errors::StowageError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "stowage.toml";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into StowageConfig
/// 4. Applies environment variable overrides (STOWAGE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read or parsed, a
/// referenced environment variable is missing, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use stowage::config::loader::load_config;
///
/// let config = load_config("stowage.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<StowageConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(StowageError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        StowageError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and
/// validation exactly like [`load_config`]
pub fn parse_config(contents: &str) -> Result<StowageConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: StowageConfig = toml::from_str(&contents)
        .map_err(|e| StowageError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        StowageError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| StowageError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(StowageError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        StowageError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}

/// Applies environment variable overrides using STOWAGE_* prefix
///
/// Environment variables follow the pattern: STOWAGE_<SECTION>_<KEY>
/// For example: STOWAGE_STORAGE_CONNECTION_STRING, STOWAGE_TABLE_MAX_BATCH_SIZE
fn apply_env_overrides(config: &mut StowageConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("STOWAGE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Storage overrides
    if let Ok(val) = std::env::var("STOWAGE_STORAGE_CONNECTION_STRING") {
        config.storage.connection_string = secret_string(val);
    }
    if let Ok(val) = std::env::var("STOWAGE_STORAGE_REQUEST_TIMEOUT_SECONDS") {
        config.storage.request_timeout_seconds =
            parse_override("STOWAGE_STORAGE_REQUEST_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("STOWAGE_STORAGE_CREATE_IF_ABSENT") {
        config.storage.create_if_absent =
            parse_override("STOWAGE_STORAGE_CREATE_IF_ABSENT", &val)?;
    }

    // Table overrides
    if let Ok(val) = std::env::var("STOWAGE_TABLE_MAX_BATCH_SIZE") {
        config.table.max_batch_size = parse_override("STOWAGE_TABLE_MAX_BATCH_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("STOWAGE_TABLE_DEFAULT_PAGE_SIZE") {
        config.table.default_page_size =
            parse_override("STOWAGE_TABLE_DEFAULT_PAGE_SIZE", &val)?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("STOWAGE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("STOWAGE_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("STOWAGE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("STOWAGE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
