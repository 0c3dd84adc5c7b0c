//! CLI command implementations
//!
//! Commands return a process exit code: 0 on success, 2 for configuration
//! errors, 3 when a container, table, blob or entity is missing, 5 for any
//! other failure.

pub mod blob;
pub mod init;
pub mod table;
pub mod validate;

use crate::adapters::backend::StorageConnection;
use crate::config::StowageConfig;
use crate::domain::StowageError;
use tokio::sync::watch;

/// Exit code of a successful command
pub const EXIT_OK: i32 = 0;
/// Exit code of a configuration error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when the requested item does not exist
pub const EXIT_NOT_FOUND: i32 = 3;
/// Exit code of any other failure
pub const EXIT_FATAL: i32 = 5;

/// Maps an error to the exit code reported for it
pub fn exit_code(error: &StowageError) -> i32 {
    match error {
        StowageError::Configuration(_) => EXIT_CONFIG,
        e if e.is_not_found() => EXIT_NOT_FOUND,
        _ => EXIT_FATAL,
    }
}

/// Opens the configured storage, wiring the shutdown signal into every
/// backend call
pub(crate) async fn connect(
    config: &StowageConfig,
    shutdown_signal: watch::Receiver<bool>,
) -> crate::domain::Result<StorageConnection> {
    let connection = StorageConnection::from_config(config).await?;
    let options = connection
        .request_options()
        .clone()
        .with_shutdown(shutdown_signal);
    Ok(connection.with_request_options(options))
}

/// Prints an error and returns its exit code
pub(crate) fn report(context: &str, error: &StowageError) -> i32 {
    crate::log_error_with_context!(error, context);
    eprintln!("❌ {context}");
    eprintln!("   Error: {error}");
    exit_code(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StorageError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code(&StowageError::Configuration("bad".to_string())),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code(&StorageError::TableNotFound("Invites".to_string()).into()),
            EXIT_NOT_FOUND
        );
        assert_eq!(
            exit_code(&StorageError::backend(409, "Conflict").into()),
            EXIT_FATAL
        );
    }
}
