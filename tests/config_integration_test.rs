//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` so they do not
//! interfere with each other.

use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use stowage::adapters::backend::StorageConnection;
use stowage::config::load_config;
use stowage::domain::StowageError;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for name in [
        "STOWAGE_APPLICATION_LOG_LEVEL",
        "STOWAGE_STORAGE_CONNECTION_STRING",
        "STOWAGE_STORAGE_REQUEST_TIMEOUT_SECONDS",
        "STOWAGE_STORAGE_CREATE_IF_ABSENT",
        "STOWAGE_TABLE_MAX_BATCH_SIZE",
        "STOWAGE_TABLE_DEFAULT_PAGE_SIZE",
        "STOWAGE_LOGGING_LOCAL_ENABLED",
        "STOWAGE_LOGGING_LOCAL_PATH",
        "STOWAGE_LOGGING_LOCAL_ROTATION",
        "TEST_STORAGE_PATH",
    ] {
        std::env::remove_var(name);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[storage]
connection_string = "file:///tmp/stowage-test/store.json"
request_timeout_seconds = 120
create_if_absent = true

[table]
max_batch_size = 25
default_page_size = 500

[logging]
local_enabled = true
local_path = "/tmp/stowage-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(
        config.storage.connection_string.expose_secret(),
        "file:///tmp/stowage-test/store.json"
    );
    assert_eq!(
        config.storage.request_timeout(),
        Some(Duration::from_secs(120))
    );
    assert!(config.storage.create_if_absent);
    assert_eq!(config.table.max_batch_size, 25);
    assert_eq!(config.table.default_page_size, 500);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "/tmp/stowage-logs");
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[storage]\nconnection_string = \"memory://\"\n");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.storage.request_timeout_seconds, 30);
    assert!(!config.storage.create_if_absent);
    assert_eq!(config.table.max_batch_size, 100);
    assert_eq!(config.table.default_page_size, 100);
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "daily");
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_STORAGE_PATH", "/var/lib/stowage");

    let temp_file = write_config(
        "[storage]\nconnection_string = \"file://${TEST_STORAGE_PATH}/store.json\"\n",
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(
        config.storage.connection_string.expose_secret(),
        "file:///var/lib/stowage/store.json"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file =
        write_config("[storage]\nconnection_string = \"${TEST_STORAGE_PATH}\"\n");
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(matches!(err, StowageError::Configuration(_)));
    assert!(err.to_string().contains("TEST_STORAGE_PATH"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("STOWAGE_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("STOWAGE_STORAGE_CONNECTION_STRING", "memory://");
    std::env::set_var("STOWAGE_STORAGE_CREATE_IF_ABSENT", "true");
    std::env::set_var("STOWAGE_TABLE_MAX_BATCH_SIZE", "10");

    let temp_file = write_config(
        r#"
[application]
log_level = "info"

[storage]
connection_string = "file:///tmp/ignored.json"

[table]
max_batch_size = 50
"#,
    );
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.storage.connection_string.expose_secret(), "memory://");
    assert!(config.storage.create_if_absent);
    assert_eq!(config.table.max_batch_size, 10);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("STOWAGE_TABLE_MAX_BATCH_SIZE", "lots");

    let temp_file = write_config("[storage]\nconnection_string = \"memory://\"\n");
    let result = load_config(temp_file.path());

    cleanup_env_vars();
    assert!(matches!(result, Err(StowageError::Configuration(_))));
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "invalid_level"

[storage]
connection_string = "memory://"
"#,
    );
    assert!(load_config(temp_file.path()).is_err());

    let temp_file = write_config(
        r#"
[storage]
connection_string = "memory://"

[table]
max_batch_size = 250
"#,
    );
    assert!(load_config(temp_file.path()).is_err());
}

#[tokio::test]
async fn test_connection_from_config() {
    let config = {
        let _lock = ENV_MUTEX.lock().unwrap();
        cleanup_env_vars();
        let temp_file = write_config(
            "[storage]\nconnection_string = \"memory://\"\nrequest_timeout_seconds = 5\n\n[table]\nmax_batch_size = 20\n",
        );
        load_config(temp_file.path()).unwrap()
    };

    let connection = StorageConnection::from_config(&config).await.unwrap();
    assert_eq!(
        connection.request_options().timeout,
        Some(Duration::from_secs(5))
    );
    assert_eq!(connection.table_client().max_batch_size(), 20);
}

#[tokio::test]
async fn test_unsupported_scheme_is_configuration_error() {
    let err = StorageConnection::open("https://account.blob.example.net")
        .await
        .unwrap_err();
    assert!(matches!(err, StowageError::Configuration(_)));
}
