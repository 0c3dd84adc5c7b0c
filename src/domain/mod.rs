//! Domain models and types for Stowage.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Validated names** ([`ContainerName`], [`TableName`])
//! - **Table model** ([`Entity`], [`EntityProperty`], [`EntityOperation`], [`TableResult`])
//! - **Query model** ([`TableQuery`], [`Comparison`], [`ContinuationToken`])
//! - **Error types** ([`StowageError`], [`StorageError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Names are newtypes that validate on construction, so an invalid container
//! or table name is rejected before any backend call:
//!
//! ```rust
//! use stowage::domain::{ContainerName, TableName};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let container = ContainerName::new("user-uploads")?;
//! let table = TableName::new("Invites")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, StowageError>`]. Absence of an
//! entity is reported through [`TableResult::status`], not as an error.

pub mod continuation;
pub mod entity;
pub mod errors;
pub mod names;
pub mod query;
pub mod result;

// Re-export commonly used types for convenience
pub use continuation::ContinuationToken;
pub use entity::{status, BatchKind, Entity, EntityOperation, EntityProperty, TableResult};
pub use errors::{StorageError, StowageError};
pub use names::{ContainerName, TableName};
pub use query::{prefix_range, Comparison, TableQuery};
pub use result::Result;
