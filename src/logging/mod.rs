//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - JSON log files with rotation
//! - Level selection from configuration or `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use stowage::logging::init_logging;
//! use stowage::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the outcome of one submitted batch chunk
///
/// # Example
///
/// ```no_run
/// use stowage::log_batch_chunk;
///
/// log_batch_chunk!("Uploads", 1, 3, 100);
/// ```
#[macro_export]
macro_rules! log_batch_chunk {
    ($table:expr, $chunk:expr, $chunks:expr, $size:expr) => {
        tracing::debug!(
            table = %$table,
            chunk = $chunk,
            chunks = $chunks,
            size = $size,
            "Submitted batch chunk"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use stowage::log_error_with_context;
/// use stowage::domain::StowageError;
///
/// let error = StowageError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
