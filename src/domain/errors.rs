//! Domain error types
//!
//! This module defines the error hierarchy for Stowage. Errors are
//! domain-specific and don't expose backend or third-party types.

use crate::domain::entity::TableResult;
use std::time::Duration;
use thiserror::Error;

/// Main Stowage error type
///
/// This is the primary error type used throughout the crate.
/// It wraps storage errors and provides context for error handling.
#[derive(Debug, Error)]
pub enum StowageError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl StowageError {
    /// Returns `true` if the error reports a missing container, table or blob
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StowageError::Storage(
                StorageError::ContainerNotFound(_)
                    | StorageError::TableNotFound(_)
                    | StorageError::BlobNotFound { .. }
            )
        )
    }

    /// Backend status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            StowageError::Storage(err) => err.status(),
            _ => None,
        }
    }
}

/// Storage-specific errors
///
/// Errors raised by the blob and table clients or surfaced by a backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Malformed reference or parameter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Container could not be resolved
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// Table could not be resolved
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Blob does not exist in its container
    #[error("Blob not found: {container}/{name}")]
    BlobNotFound { container: String, name: String },

    /// Failure reported by the remote service
    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    /// A batch chunk failed after earlier chunks were committed
    #[error(
        "Batch aborted at chunk {failed_chunk} after {} committed results: {source}",
        completed.len()
    )]
    BatchAborted {
        /// Results of the chunks committed before the failure, in input order
        completed: Vec<TableResult>,
        /// Zero-based index of the chunk that failed
        failed_chunk: usize,
        /// Failure of that chunk
        source: Box<StorageError>,
    },

    /// Backend call exceeded its deadline
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Backend call interrupted by a shutdown signal
    #[error("Request cancelled")]
    Cancelled,
}

impl StorageError {
    /// Creates an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a backend error with a status code
    pub fn backend(status: u16, msg: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: msg.into(),
        }
    }

    /// Backend status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Backend { status, .. } => Some(*status),
            StorageError::BatchAborted { source, .. } => source.status(),
            _ => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for StowageError {
    fn from(err: std::io::Error) -> Self {
        StowageError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StowageError {
    fn from(err: serde_json::Error) -> Self {
        StowageError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for StowageError {
    fn from(err: toml::de::Error) -> Self {
        StowageError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from base64 decode errors (continuation tokens)
impl From<base64::DecodeError> for StowageError {
    fn from(err: base64::DecodeError) -> Self {
        StowageError::Serialization(format!("Base64 decode error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stowage_error_display() {
        let err = StowageError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_storage_error_conversion() {
        let storage_err = StorageError::TableNotFound("orders".to_string());
        let err: StowageError = storage_err.into();
        assert!(matches!(err, StowageError::Storage(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_backend_status() {
        let err: StowageError = StorageError::backend(409, "Conflict").into();
        assert_eq!(err.status(), Some(409));
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Storage error: Backend error: 409 - Conflict"
        );
    }

    #[test]
    fn test_batch_aborted_carries_source_status() {
        let err = StorageError::BatchAborted {
            completed: vec![TableResult::with_status(204), TableResult::with_status(204)],
            failed_chunk: 1,
            source: Box::new(StorageError::backend(400, "Bad batch")),
        };
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("after 2 committed results"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: StowageError = io_err.into();
        assert!(matches!(err, StowageError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: StowageError = json_err.into();
        assert!(matches!(err, StowageError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: StowageError = toml_err.into();
        assert!(matches!(err, StowageError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_stowage_error_implements_std_error() {
        let err = StowageError::Other("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
