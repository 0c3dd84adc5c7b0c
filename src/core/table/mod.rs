//! Table store client and its batching and query helpers

pub mod batch;
pub mod client;
pub mod query;

pub use batch::MAX_BATCH_SIZE;
pub use client::TableStoreClient;
