//! # Stowage - Blob and Table Storage Client Core
//!
//! Stowage is a backend-agnostic client core for object and table storage.
//! It resolves containers and tables with a per-client cache, moves blobs in
//! and out with overwrite and create-if-absent policies, runs entity CRUD,
//! splits batches into chunks of at most 100 operations, and reads
//! partitions one segment at a time with text-serialisable continuation
//! tokens.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Blob and table clients, reference cache, batch chunking
//! - [`adapters`] - Backend traits, connection factory, in-memory emulator
//! - [`domain`] - Names, entities, queries, continuation tokens, errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use stowage::adapters::backend::StorageConnection;
//! use stowage::domain::{BatchKind, ContinuationToken, Entity};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = StorageConnection::open("memory://").await?;
//!
//! // Blobs
//! let blobs = connection.blob_client();
//! blobs.container("reports", true).await?;
//! blobs.upload_json("reports", "summary.json", r#"{"ok":true}"#, true).await?;
//!
//! // Tables
//! let tables = connection.table_client();
//! let table = tables.table("Invites", true).await?;
//! let invites = (0..25).map(|i| Entity::new("team-1", format!("{i:03}"))).collect();
//! tables.batch(&table, invites, BatchKind::Upsert).await?;
//!
//! let page = tables
//!     .query_segment_by_row_key_range(&table, "team-1", "000", "999", None, 10)
//!     .await?;
//!
//! // Hand the token to a client, read the next page later
//! if let Some(token) = page.continuation {
//!     let text = token.to_text();
//!     let resumed = ContinuationToken::from_text(&text)?;
//!     let next = tables
//!         .query_segment_by_row_key_range(&table, "team-1", "000", "999", resumed.as_ref(), 10)
//!         .await?;
//!     assert_eq!(next.entities.len(), 10);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error type is
//! [`domain::StowageError`]. A missing entity is not an error: it comes back
//! as a [`domain::TableResult`] with status 404.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
