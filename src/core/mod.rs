//! Core client logic for Stowage.
//!
//! This module contains the two storage clients and what they share.
//!
//! # Modules
//!
//! - [`blob`] - Container resolution and blob upload/download
//! - [`table`] - Table resolution, entity operations, chunked batches and
//!   segmented queries
//! - [`cache`] - Single-flight cache of resolved container and table handles
//!
//! # Resolution
//!
//! Both clients resolve collections the same way:
//!
//! 1. **Validate**: reject malformed names before any backend call
//! 2. **Cache**: return a handle resolved earlier by this client
//! 3. **Check**: ask the backend whether the collection exists
//! 4. **Create** (optional): create it when asked to
//! 5. **Remember**: cache the handle; absence is never cached
//!
//! # Example
//!
//! ```rust
//! use stowage::adapters::backend::StorageConnection;
//! use stowage::domain::{ContinuationToken, Entity};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = StorageConnection::open("memory://").await?;
//! let tables = connection.table_client();
//! let table = tables.table("Events", true).await?;
//!
//! for i in 0..30 {
//!     tables.insert(&table, Entity::new("e1", format!("{i:02}"))).await?;
//! }
//!
//! let first = tables
//!     .query_segment_by_row_key_range(&table, "e1", "00", "29", None, 20)
//!     .await?;
//!
//! // Tokens survive a trip through text
//! let text = first.continuation.map(|t| t.to_text()).unwrap_or_default();
//! let token = ContinuationToken::from_text(&text)?;
//! let rest = tables
//!     .query_segment_by_row_key_range(&table, "e1", "00", "29", token.as_ref(), 20)
//!     .await?;
//! assert_eq!(first.entities.len() + rest.entities.len(), 30);
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod cache;
pub mod table;
