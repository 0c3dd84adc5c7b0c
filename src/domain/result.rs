//! Result type alias for Stowage

use super::errors::StowageError;

/// Result type alias for Stowage operations
///
/// # Examples
///
/// ```
/// use stowage::domain::result::Result;
/// use stowage::domain::errors::{StorageError, StowageError};
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(StorageError::invalid_argument("bad name").into())
/// }
/// ```
pub type Result<T> = std::result::Result<T, StowageError>;
