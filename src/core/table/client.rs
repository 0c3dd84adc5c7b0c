//! Table store client
//!
//! [`TableStoreClient`] resolves tables, runs single-entity operations,
//! submits batches in chunks and reads partitions one segment at a time.
//!
//! # Example
//!
//! ```rust
//! use stowage::adapters::backend::StorageConnection;
//! use stowage::domain::{BatchKind, Entity};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = StorageConnection::open("memory://").await?;
//! let tables = connection.table_client();
//! let table = tables.table("Uploads", true).await?;
//!
//! let entities = (0..250)
//!     .map(|i| Entity::new("user-1", format!("{i:04}")))
//!     .collect();
//! let results = tables.batch(&table, entities, BatchKind::Insert).await?;
//! assert_eq!(results.len(), 250);
//!
//! let page = tables
//!     .query_segment_by_row_key_range(&table, "user-1", "0000", "0099", None, 50)
//!     .await?;
//! assert_eq!(page.entities.len(), 50);
//! assert!(page.continuation.is_some());
//! # Ok(())
//! # }
//! ```

use crate::adapters::backend::options::RequestOptions;
use crate::adapters::backend::traits::{QuerySegment, TableBackend, TableHandle};
use crate::core::cache::HandleCache;
use crate::core::table::batch::{self, MAX_BATCH_SIZE};
use crate::core::table::query::{check_page_size, range_query, segment_query};
use crate::domain::continuation::ContinuationToken;
use crate::domain::entity::{BatchKind, Entity, EntityOperation, TableResult};
use crate::domain::names::TableName;
use crate::domain::query::{Comparison, TableQuery};
use crate::domain::{Result, StorageError, StowageError};
use futures::stream::{self, Stream, TryStreamExt};
use std::sync::Arc;

/// Client for tables
///
/// Cloning is cheap; clones share the backend and the table cache.
#[derive(Clone)]
pub struct TableStoreClient {
    backend: Arc<dyn TableBackend>,
    tables: Arc<HandleCache<TableHandle>>,
    options: RequestOptions,
    max_batch_size: usize,
}

impl TableStoreClient {
    /// Creates a client with an empty table cache
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self {
            backend,
            tables: Arc::new(HandleCache::new()),
            options: RequestOptions::default(),
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Sets the options applied to every backend call
    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the chunk size of batches, clamped to `1..=100`
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Chunk size of batches
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Number of tables held in the cache
    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }

    /// Resolves a table by name
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the table does not exist and was not created.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an invalid name, or the backend error if
    /// the existence check or the creation fails.
    pub async fn resolve_table(
        &self,
        name: &str,
        create_if_absent: bool,
    ) -> Result<Option<TableHandle>> {
        let name = TableName::new(name).map_err(StorageError::InvalidArgument)?;

        if let Some(handle) = self.tables.get(name.as_str()) {
            tracing::debug!(table = %name, "Table cache hit");
            return Ok(Some(handle));
        }

        self.tables
            .get_or_resolve(name.as_str(), || async {
                let handle = self.backend.table_handle(&name);
                if self.options.run(self.backend.table_exists(&handle)).await? {
                    tracing::debug!(table = %name, "Resolved existing table");
                    return Ok(Some(handle));
                }

                if !create_if_absent {
                    tracing::debug!(table = %name, "Table does not exist");
                    return Ok(None);
                }

                let created = self
                    .options
                    .run(self.backend.create_table_if_absent(&handle))
                    .await?;
                tracing::info!(table = %name, created, "Created table");
                Ok(Some(handle))
            })
            .await
    }

    /// Resolves a table that must exist (or be created)
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound` where [`resolve_table`](Self::resolve_table)
    /// returns `Ok(None)`.
    pub async fn table(&self, name: &str, create_if_absent: bool) -> Result<TableHandle> {
        self.resolve_table(name, create_if_absent)
            .await?
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()).into())
    }

    /// Applies one operation kind to every entity, in chunks
    ///
    /// See [`execute_batch`](Self::execute_batch) for chunking and failure
    /// behavior.
    pub async fn batch(
        &self,
        table: &TableHandle,
        entities: Vec<Entity>,
        kind: BatchKind,
    ) -> Result<Vec<TableResult>> {
        let operations = entities.into_iter().map(|e| kind.operation(e)).collect();
        self.execute_batch(table, operations).await
    }

    /// Resolves a table by name, then runs [`batch`](Self::batch)
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound` if the table does not exist and was not created.
    pub async fn batch_in(
        &self,
        table_name: &str,
        entities: Vec<Entity>,
        kind: BatchKind,
        create_if_absent: bool,
    ) -> Result<Vec<TableResult>> {
        let table = self.table(table_name, create_if_absent).await?;
        self.batch(&table, entities, kind).await
    }

    /// Submits operations in consecutive chunks of at most
    /// [`max_batch_size`](Self::max_batch_size)
    ///
    /// Chunks are submitted one after another, each as one atomic backend
    /// batch. Results come back in input order.
    ///
    /// # Errors
    ///
    /// A failing chunk stops the remaining chunks. If the first chunk fails,
    /// its error is returned. A later failure returns `BatchAborted` holding
    /// the results of the chunks already committed.
    pub async fn execute_batch(
        &self,
        table: &TableHandle,
        operations: Vec<EntityOperation>,
    ) -> Result<Vec<TableResult>> {
        if operations.is_empty() {
            return Ok(Vec::new());
        }

        let total = operations.len();
        let chunks = batch::chunk(operations, self.max_batch_size);
        let chunk_count = chunks.len();
        let mut results = Vec::with_capacity(total);

        for (index, chunk) in chunks.into_iter().enumerate() {
            let size = chunk.len();
            match self
                .options
                .run(self.backend.execute_batch(table, chunk))
                .await
            {
                Ok(chunk_results) => {
                    crate::log_batch_chunk!(table.name(), index + 1, chunk_count, size);
                    results.extend(chunk_results);
                }
                Err(e) => {
                    tracing::warn!(
                        table = %table.name(),
                        failed_chunk = index,
                        chunks = chunk_count,
                        committed = results.len(),
                        error = %e,
                        "Batch aborted"
                    );
                    return Err(batch::abort(results, index, e));
                }
            }
        }

        Ok(results)
    }

    /// Executes a single operation and returns the backend result untouched
    pub async fn execute(
        &self,
        table: &TableHandle,
        operation: EntityOperation,
    ) -> Result<TableResult> {
        let name = operation.name();
        let result = self
            .options
            .run(self.backend.execute(table, operation))
            .await?;
        tracing::debug!(
            table = %table.name(),
            operation = name,
            status = result.status,
            "Executed table operation"
        );
        Ok(result)
    }

    /// Inserts an entity
    pub async fn insert(&self, table: &TableHandle, entity: Entity) -> Result<TableResult> {
        self.execute(table, EntityOperation::Insert(entity)).await
    }

    /// Inserts an entity or replaces the existing one
    pub async fn insert_or_replace(
        &self,
        table: &TableHandle,
        entity: Entity,
    ) -> Result<TableResult> {
        self.execute(table, EntityOperation::InsertOrReplace(entity))
            .await
    }

    /// Inserts an entity or merges it into the existing one
    pub async fn insert_or_merge(
        &self,
        table: &TableHandle,
        entity: Entity,
    ) -> Result<TableResult> {
        self.execute(table, EntityOperation::InsertOrMerge(entity))
            .await
    }

    /// Looks up one entity by key
    ///
    /// An absent entity is a result with status 404, not an error.
    pub async fn retrieve(
        &self,
        table: &TableHandle,
        partition_key: &str,
        row_key: &str,
    ) -> Result<TableResult> {
        self.execute(
            table,
            EntityOperation::Retrieve {
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
            },
        )
        .await
    }

    /// Replaces an existing entity after reconciling it with the stored one
    ///
    /// The stored entity with the same keys is read first. If there is none,
    /// a 404 result is returned and `merge` is not called. Otherwise
    /// `merge(&mut local, &stored)` runs, when given, and `local` replaces the
    /// stored entity unconditionally.
    pub async fn replace_with_merge<F>(
        &self,
        table: &TableHandle,
        mut local: Entity,
        merge: Option<F>,
    ) -> Result<TableResult>
    where
        F: FnOnce(&mut Entity, &Entity),
    {
        let retrieved = self
            .retrieve(table, local.partition_key(), local.row_key())
            .await?;

        let stored = match retrieved.into_entity() {
            Ok(stored) => stored,
            Err(status) => {
                tracing::debug!(
                    table = %table.name(),
                    partition_key = local.partition_key(),
                    row_key = local.row_key(),
                    status,
                    "No stored entity to replace"
                );
                return Ok(TableResult::not_found());
            }
        };

        if let Some(merge) = merge {
            merge(&mut local, &stored);
        }
        self.execute(table, EntityOperation::Replace(local)).await
    }

    /// Replaces an existing entity as is
    pub async fn replace(&self, table: &TableHandle, local: Entity) -> Result<TableResult> {
        self.replace_with_merge(table, local, None::<fn(&mut Entity, &Entity)>)
            .await
    }

    /// Deletes an entity by key
    ///
    /// The entity is read first; if it is absent a 404 result is returned and
    /// no delete is issued.
    pub async fn remove(
        &self,
        table: &TableHandle,
        partition_key: &str,
        row_key: &str,
    ) -> Result<TableResult> {
        let retrieved = self.retrieve(table, partition_key, row_key).await?;
        match retrieved.into_entity() {
            Ok(stored) => self.execute(table, EntityOperation::Delete(stored)).await,
            Err(_) => Ok(TableResult::not_found()),
        }
    }

    /// Reads one segment of a partition
    ///
    /// When `row_key_filter` holds a non-blank value the row key must also
    /// satisfy `comparison` against it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `page_size` is outside `1..=1000`.
    pub async fn query_segment(
        &self,
        table: &TableHandle,
        partition_key: &str,
        token: Option<&ContinuationToken>,
        page_size: usize,
        row_key_filter: Option<&str>,
        comparison: Comparison,
    ) -> Result<QuerySegment> {
        let query = segment_query(partition_key, page_size, row_key_filter, comparison)?;
        self.execute_query(table, &query, token).await
    }

    /// Reads one segment of a partition restricted to row keys in
    /// `[row_key_from, row_key_to]`
    ///
    /// Pair with [`prefix_range`](crate::domain::prefix_range) for prefix
    /// scans.
    pub async fn query_segment_by_row_key_range(
        &self,
        table: &TableHandle,
        partition_key: &str,
        row_key_from: &str,
        row_key_to: &str,
        token: Option<&ContinuationToken>,
        page_size: usize,
    ) -> Result<QuerySegment> {
        let query = range_query(partition_key, row_key_from, row_key_to, page_size)?;
        self.execute_query(table, &query, token).await
    }

    /// Reads one segment of an arbitrary query
    pub async fn execute_query(
        &self,
        table: &TableHandle,
        query: &TableQuery,
        token: Option<&ContinuationToken>,
    ) -> Result<QuerySegment> {
        check_page_size(query.page_size())?;

        let segment = self
            .options
            .run(self.backend.execute_query_segment(table, query, token))
            .await?;

        tracing::debug!(
            table = %table.name(),
            filter = %query,
            resumed = token.is_some(),
            returned = segment.entities.len(),
            more = segment.continuation.is_some(),
            "Read query segment"
        );
        Ok(segment)
    }

    /// Streams the entities of every segment of a query
    ///
    /// Segments are fetched lazily; the next one is requested only after the
    /// entities of the previous one have been consumed.
    ///
    /// # Errors
    ///
    /// Yields a backend error if the backend hands back the token it was
    /// given, which would otherwise loop forever.
    pub fn query_stream<'a>(
        &'a self,
        table: &'a TableHandle,
        query: &'a TableQuery,
    ) -> impl Stream<Item = Result<Entity>> + 'a {
        self.query_stream_from(table, query, None)
    }

    /// Streams the entities of a query starting at `token`
    ///
    /// Same as [`query_stream`](Self::query_stream) when `token` is `None`.
    pub fn query_stream_from<'a>(
        &'a self,
        table: &'a TableHandle,
        query: &'a TableQuery,
        token: Option<ContinuationToken>,
    ) -> impl Stream<Item = Result<Entity>> + 'a {
        // None once the last segment has been read
        let start: Option<Option<ContinuationToken>> = Some(token);

        stream::try_unfold(start, move |cursor| self.next_segment(table, query, cursor))
            .map_ok(|entities| stream::iter(entities.into_iter().map(Ok::<Entity, StowageError>)))
            .try_flatten()
    }

    /// Reads every segment of a query and returns all entities
    pub async fn query_all(&self, table: &TableHandle, query: &TableQuery) -> Result<Vec<Entity>> {
        self.query_stream(table, query).try_collect().await
    }

    async fn next_segment(
        &self,
        table: &TableHandle,
        query: &TableQuery,
        cursor: Option<Option<ContinuationToken>>,
    ) -> Result<Option<(Vec<Entity>, Option<Option<ContinuationToken>>)>> {
        let Some(token) = cursor else {
            return Ok(None);
        };

        let segment = self.execute_query(table, query, token.as_ref()).await?;
        let cursor = match segment.continuation {
            Some(next) if token.as_ref() == Some(&next) => {
                return Err(StorageError::backend(
                    crate::domain::status::INTERNAL_SERVER_ERROR,
                    format!("Query on {} did not advance past {next}", table.name()),
                )
                .into());
            }
            Some(next) => Some(Some(next)),
            None => None,
        };

        Ok(Some((segment.entities, cursor)))
    }
}

impl std::fmt::Debug for TableStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStoreClient")
            .field("cached_tables", &self.tables.len())
            .field("max_batch_size", &self.max_batch_size)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
