//! Storage backend abstraction traits
//!
//! This module defines the capability traits that storage backends must
//! implement to serve the blob and table clients, together with the handle
//! types they hand out.

use crate::domain::continuation::ContinuationToken;
use crate::domain::entity::{Entity, EntityOperation, TableResult};
use crate::domain::names::{ContainerName, TableName};
use crate::domain::query::TableQuery;
use crate::domain::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type assigned to blobs uploaded without one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Media type of JSON payloads
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Reference to a blob container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    name: ContainerName,
    uri: String,
}

impl ContainerHandle {
    /// Creates a handle; only backends should call this
    pub fn new(name: ContainerName, uri: impl Into<String>) -> Self {
        Self {
            name,
            uri: uri.into(),
        }
    }

    /// Container name
    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    /// Backend address of the container
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Reference to a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableHandle {
    name: TableName,
    uri: String,
}

impl TableHandle {
    /// Creates a handle; only backends should call this
    pub fn new(name: TableName, uri: impl Into<String>) -> Self {
        Self {
            name,
            uri: uri.into(),
        }
    }

    /// Table name
    pub fn name(&self) -> &TableName {
        &self.name
    }

    /// Backend address of the table
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Reference to a blob inside a container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobHandle {
    pub container: ContainerHandle,
    pub name: String,
}

impl BlobHandle {
    /// Creates a blob handle
    pub fn new(container: ContainerHandle, name: impl Into<String>) -> Self {
        Self {
            container,
            name: name.into(),
        }
    }

    /// Backend address of the blob
    pub fn uri(&self) -> String {
        format!("{}/{}", self.container.uri(), self.name)
    }
}

/// Mutable and system properties of a blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobProperties {
    /// Media type of the content
    pub content_type: String,

    /// Content length in bytes; ignored on updates
    #[serde(default)]
    pub content_length: u64,

    /// Concurrency tag; ignored on updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl BlobProperties {
    /// Properties update that only sets the content type
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content_length: 0,
            etag: None,
        }
    }
}

/// One page of query results and the token to resume after it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySegment {
    /// Entities of this page, at most the query's page size
    pub entities: Vec<Entity>,

    /// Resume point, `None` when the query is exhausted
    pub continuation: Option<ContinuationToken>,
}

impl QuerySegment {
    /// Returns `true` if no further segment exists
    pub fn is_last(&self) -> bool {
        self.continuation.is_none()
    }
}

/// Blob backend capability trait
///
/// Every method maps to one call against the storage service. Backends report
/// service failures as [`StorageError::Backend`](crate::domain::StorageError::Backend).
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Builds a handle for a container without contacting the service
    fn container_handle(&self, name: &ContainerName) -> ContainerHandle;

    /// Checks whether the container exists
    async fn container_exists(&self, container: &ContainerHandle) -> Result<bool>;

    /// Creates the container unless it exists
    ///
    /// # Returns
    ///
    /// Returns `true` if the container was created by this call.
    async fn create_container_if_absent(&self, container: &ContainerHandle) -> Result<bool>;

    /// Checks whether a blob exists
    async fn blob_exists(&self, container: &ContainerHandle, name: &str) -> Result<bool>;

    /// Writes the full content of a blob, replacing any existing content
    ///
    /// A replaced blob keeps no properties of its previous version.
    async fn upload_blob(
        &self,
        container: &ContainerHandle,
        name: &str,
        content: Vec<u8>,
    ) -> Result<BlobHandle>;

    /// Reads the full content of a blob
    ///
    /// # Errors
    ///
    /// Returns `BlobNotFound` if the blob does not exist.
    async fn download_blob(&self, container: &ContainerHandle, name: &str) -> Result<Vec<u8>>;

    /// Updates the mutable properties of a blob
    async fn set_blob_properties(&self, blob: &BlobHandle, properties: &BlobProperties)
        -> Result<()>;

    /// Reads the properties of a blob
    async fn blob_properties(&self, blob: &BlobHandle) -> Result<BlobProperties>;

    /// Deletes a blob
    ///
    /// # Returns
    ///
    /// Returns `true` if a blob was deleted.
    async fn delete_blob(&self, blob: &BlobHandle) -> Result<bool>;
}

/// Table backend capability trait
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Builds a handle for a table without contacting the service
    fn table_handle(&self, name: &TableName) -> TableHandle;

    /// Checks whether the table exists
    async fn table_exists(&self, table: &TableHandle) -> Result<bool>;

    /// Creates the table unless it exists
    ///
    /// # Returns
    ///
    /// Returns `true` if the table was created by this call.
    async fn create_table_if_absent(&self, table: &TableHandle) -> Result<bool>;

    /// Executes a single entity operation
    ///
    /// Service-level outcomes (not found, conflict) are reported through the
    /// status of the returned [`TableResult`]; `Err` is reserved for failures
    /// to reach or use the service.
    async fn execute(&self, table: &TableHandle, operation: EntityOperation)
        -> Result<TableResult>;

    /// Executes a group of operations atomically
    ///
    /// Either every operation applies and one result per operation is
    /// returned in order, or none applies and an error is returned.
    async fn execute_batch(
        &self,
        table: &TableHandle,
        operations: Vec<EntityOperation>,
    ) -> Result<Vec<TableResult>>;

    /// Returns one segment of a query, resuming at `token` when given
    async fn execute_query_segment(
        &self,
        table: &TableHandle,
        query: &TableQuery,
        token: Option<&ContinuationToken>,
    ) -> Result<QuerySegment>;
}
