//! Storage backends for Stowage.
//!
//! - [`backend`] - Capability traits, request options and the connection factory
//! - [`memory`] - In-process emulator with optional JSON snapshot persistence
//!
//! # Design Pattern
//!
//! The clients in [`crate::core`] only talk to `dyn BlobBackend` and
//! `dyn TableBackend`. A transport to a real storage service plugs in by
//! implementing those traits; tests wrap the emulator to count and fail calls.
//!
//! ```rust
//! use stowage::adapters::backend::StorageConnection;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = StorageConnection::open("memory://").await?;
//! let blobs = connection.blob_client();
//! let tables = connection.table_client();
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod memory;
