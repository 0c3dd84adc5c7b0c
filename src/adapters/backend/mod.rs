//! Storage backend abstraction layer
//!
//! This module provides the capability traits the blob and table clients are
//! written against, the per-call request options, and the factory that turns
//! a connection string into a [`StorageConnection`].

pub mod factory;
pub mod options;
pub mod traits;

pub use factory::StorageConnection;
pub use options::RequestOptions;
pub use traits::{
    BlobBackend, BlobHandle, BlobProperties, ContainerHandle, QuerySegment, TableBackend,
    TableHandle,
};
