//! In-process storage emulator
//!
//! [`MemoryBackend`] serves both the blob and the table capability traits from
//! one in-memory [`Store`]. When opened on a snapshot file, every mutation is
//! written through to that file so state survives across processes.

use crate::adapters::backend::traits::{
    BlobBackend, BlobHandle, BlobProperties, ContainerHandle, QuerySegment, TableBackend,
    TableHandle,
};
use crate::adapters::memory::store::{
    apply, apply_batch, new_etag, query_segment, Rows, Store, StoredBlob,
};
use crate::domain::continuation::ContinuationToken;
use crate::domain::entity::{EntityOperation, TableResult};
use crate::domain::names::{ContainerName, TableName};
use crate::domain::query::TableQuery;
use crate::domain::{Result, StorageError, StowageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Storage emulator implementing [`BlobBackend`] and [`TableBackend`]
#[derive(Debug)]
pub struct MemoryBackend {
    /// Address prefix of handles
    base_uri: String,

    /// Emulator state
    store: Mutex<Store>,

    /// Snapshot file written after each mutation, if persistent
    snapshot: Option<PathBuf>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates a volatile emulator
    pub fn new() -> Self {
        Self {
            base_uri: "memory://local".to_string(),
            store: Mutex::new(Store::default()),
            snapshot: None,
        }
    }

    /// Opens an emulator persisted to a JSON snapshot file
    ///
    /// The file is loaded if it exists and created on the first mutation
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let store = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Store>(&bytes).map_err(|e| {
                StowageError::Serialization(format!(
                    "Invalid snapshot file {}: {e}",
                    path.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Store::default(),
            Err(e) => {
                return Err(StowageError::Io(format!(
                    "Failed to read snapshot file {}: {e}",
                    path.display()
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            containers = store.containers.len(),
            tables = store.tables.len(),
            "Opened storage snapshot"
        );

        Ok(Self {
            base_uri: format!("file://{}", path.display()),
            store: Mutex::new(store),
            snapshot: Some(path),
        })
    }

    /// Path of the snapshot file, if persistent
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Writes the snapshot file, replacing it atomically
    async fn persist(&self, store: &Store) -> Result<()> {
        let Some(ref path) = self.snapshot else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(store)?;
        let staging = path.with_extension("tmp");
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, path).await?;
        Ok(())
    }

    /// Applies `change` to the store and keeps the result only once the
    /// snapshot holding it has been written
    ///
    /// `change` returns its value and whether it modified the store. A
    /// failed snapshot write leaves the store as it was before the call.
    async fn commit<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Store) -> Result<(T, bool)>,
    {
        let mut store = self.store.lock().await;
        if self.snapshot.is_none() {
            let (value, _) = change(&mut store)?;
            return Ok(value);
        }

        let mut staged = store.clone();
        let (value, changed) = change(&mut staged)?;
        if changed {
            self.persist(&staged).await?;
            *store = staged;
        }
        Ok(value)
    }

    fn rows_mut<'a>(store: &'a mut Store, table: &TableHandle) -> Result<&'a mut Rows> {
        store
            .tables
            .get_mut(table.name().as_str())
            .ok_or_else(|| StorageError::TableNotFound(table.name().to_string()).into())
    }
}

fn container_not_found(container: &ContainerHandle) -> StowageError {
    StorageError::ContainerNotFound(container.name().to_string()).into()
}

fn blob_not_found(container: &ContainerHandle, name: &str) -> StowageError {
    StorageError::BlobNotFound {
        container: container.name().to_string(),
        name: name.to_string(),
    }
    .into()
}

#[async_trait]
impl BlobBackend for MemoryBackend {
    fn container_handle(&self, name: &ContainerName) -> ContainerHandle {
        ContainerHandle::new(name.clone(), format!("{}/blobs/{name}", self.base_uri))
    }

    async fn container_exists(&self, container: &ContainerHandle) -> Result<bool> {
        let store = self.store.lock().await;
        Ok(store.containers.contains_key(container.name().as_str()))
    }

    async fn create_container_if_absent(&self, container: &ContainerHandle) -> Result<bool> {
        self.commit(|store| {
            if store.containers.contains_key(container.name().as_str()) {
                return Ok((false, false));
            }
            store
                .containers
                .insert(container.name().to_string(), Default::default());
            Ok((true, true))
        })
        .await
    }

    async fn blob_exists(&self, container: &ContainerHandle, name: &str) -> Result<bool> {
        let store = self.store.lock().await;
        let blobs = store
            .containers
            .get(container.name().as_str())
            .ok_or_else(|| container_not_found(container))?;
        Ok(blobs.contains_key(name))
    }

    async fn upload_blob(
        &self,
        container: &ContainerHandle,
        name: &str,
        content: Vec<u8>,
    ) -> Result<BlobHandle> {
        self.commit(|store| {
            let blobs = store
                .containers
                .get_mut(container.name().as_str())
                .ok_or_else(|| container_not_found(container))?;
            blobs.insert(name.to_string(), StoredBlob::new(content));
            Ok(((), true))
        })
        .await?;
        Ok(BlobHandle::new(container.clone(), name))
    }

    async fn download_blob(&self, container: &ContainerHandle, name: &str) -> Result<Vec<u8>> {
        let store = self.store.lock().await;
        let blobs = store
            .containers
            .get(container.name().as_str())
            .ok_or_else(|| container_not_found(container))?;
        blobs
            .get(name)
            .map(|blob| blob.content.clone())
            .ok_or_else(|| blob_not_found(container, name))
    }

    async fn set_blob_properties(
        &self,
        blob: &BlobHandle,
        properties: &BlobProperties,
    ) -> Result<()> {
        self.commit(|store| {
            let stored = store
                .containers
                .get_mut(blob.container.name().as_str())
                .and_then(|blobs| blobs.get_mut(&blob.name))
                .ok_or_else(|| blob_not_found(&blob.container, &blob.name))?;
            stored.content_type = properties.content_type.clone();
            stored.etag = new_etag();
            Ok(((), true))
        })
        .await
    }

    async fn blob_properties(&self, blob: &BlobHandle) -> Result<BlobProperties> {
        let store = self.store.lock().await;
        let stored = store
            .containers
            .get(blob.container.name().as_str())
            .and_then(|blobs| blobs.get(&blob.name))
            .ok_or_else(|| blob_not_found(&blob.container, &blob.name))?;
        Ok(BlobProperties {
            content_type: stored.content_type.clone(),
            content_length: stored.content.len() as u64,
            etag: Some(stored.etag.clone()),
        })
    }

    async fn delete_blob(&self, blob: &BlobHandle) -> Result<bool> {
        self.commit(|store| {
            let blobs = store
                .containers
                .get_mut(blob.container.name().as_str())
                .ok_or_else(|| container_not_found(&blob.container))?;
            let deleted = blobs.remove(&blob.name).is_some();
            Ok((deleted, deleted))
        })
        .await
    }
}

#[async_trait]
impl TableBackend for MemoryBackend {
    fn table_handle(&self, name: &TableName) -> TableHandle {
        TableHandle::new(name.clone(), format!("{}/tables/{name}", self.base_uri))
    }

    async fn table_exists(&self, table: &TableHandle) -> Result<bool> {
        let store = self.store.lock().await;
        Ok(store.tables.contains_key(table.name().as_str()))
    }

    async fn create_table_if_absent(&self, table: &TableHandle) -> Result<bool> {
        self.commit(|store| {
            if store.tables.contains_key(table.name().as_str()) {
                return Ok((false, false));
            }
            store
                .tables
                .insert(table.name().to_string(), Rows::default());
            Ok((true, true))
        })
        .await
    }

    async fn execute(
        &self,
        table: &TableHandle,
        operation: EntityOperation,
    ) -> Result<TableResult> {
        if matches!(operation, EntityOperation::Retrieve { .. }) {
            let mut store = self.store.lock().await;
            return Ok(apply(Self::rows_mut(&mut store, table)?, operation));
        }

        self.commit(|store| {
            let result = apply(Self::rows_mut(store, table)?, operation);
            let changed = result.is_success();
            Ok((result, changed))
        })
        .await
    }

    async fn execute_batch(
        &self,
        table: &TableHandle,
        operations: Vec<EntityOperation>,
    ) -> Result<Vec<TableResult>> {
        self.commit(|store| {
            let results = apply_batch(Self::rows_mut(store, table)?, operations)?;
            let changed = !results.is_empty();
            Ok((results, changed))
        })
        .await
    }

    async fn execute_query_segment(
        &self,
        table: &TableHandle,
        query: &TableQuery,
        token: Option<&ContinuationToken>,
    ) -> Result<QuerySegment> {
        let store = self.store.lock().await;
        let rows = store
            .tables
            .get(table.name().as_str())
            .ok_or_else(|| StorageError::TableNotFound(table.name().to_string()))?;
        Ok(query_segment(rows, query, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Entity;
    use tempfile::TempDir;

    fn container(backend: &MemoryBackend) -> ContainerHandle {
        backend.container_handle(&ContainerName::new("media").unwrap())
    }

    #[tokio::test]
    async fn test_container_lifecycle() {
        let backend = MemoryBackend::new();
        let handle = container(&backend);
        assert_eq!(handle.uri(), "memory://local/blobs/media");

        assert!(!backend.container_exists(&handle).await.unwrap());
        assert!(backend.create_container_if_absent(&handle).await.unwrap());
        assert!(!backend.create_container_if_absent(&handle).await.unwrap());
        assert!(backend.container_exists(&handle).await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_resets_properties() {
        let backend = MemoryBackend::new();
        let handle = container(&backend);
        backend.create_container_if_absent(&handle).await.unwrap();

        let blob = backend
            .upload_blob(&handle, "a.json", b"{}".to_vec())
            .await
            .unwrap();
        backend
            .set_blob_properties(&blob, &BlobProperties::with_content_type("application/json"))
            .await
            .unwrap();
        backend
            .upload_blob(&handle, "a.json", b"[]".to_vec())
            .await
            .unwrap();

        let properties = backend.blob_properties(&blob).await.unwrap();
        assert_eq!(properties.content_type, "application/octet-stream");
        assert_eq!(properties.content_length, 2);
    }

    #[tokio::test]
    async fn test_missing_blob_and_container() {
        let backend = MemoryBackend::new();
        let handle = container(&backend);

        let err = backend.download_blob(&handle, "x").await.unwrap_err();
        assert!(matches!(
            err,
            StowageError::Storage(StorageError::ContainerNotFound(_))
        ));

        backend.create_container_if_absent(&handle).await.unwrap();
        let err = backend.download_blob(&handle, "x").await.unwrap_err();
        assert!(matches!(
            err,
            StowageError::Storage(StorageError::BlobNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_execute_on_missing_table_fails() {
        let backend = MemoryBackend::new();
        let table = backend.table_handle(&TableName::new("Missing").unwrap());
        let err = backend
            .execute(&table, EntityOperation::Insert(Entity::new("p", "r")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let backend = MemoryBackend::open(&path).await.unwrap();
            let table = backend.table_handle(&TableName::new("Uploads").unwrap());
            backend.create_table_if_absent(&table).await.unwrap();
            backend
                .execute(
                    &table,
                    EntityOperation::Insert(Entity::new("user-1", "a.png").with("Size", 42)),
                )
                .await
                .unwrap();

            let media = container(&backend);
            backend.create_container_if_absent(&media).await.unwrap();
            backend
                .upload_blob(&media, "a.png", vec![1, 2, 3])
                .await
                .unwrap();
        }

        let reopened = MemoryBackend::open(&path).await.unwrap();
        assert_eq!(reopened.snapshot_path(), Some(path.as_path()));

        let table = reopened.table_handle(&TableName::new("Uploads").unwrap());
        let result = reopened
            .execute(
                &table,
                EntityOperation::Retrieve {
                    partition_key: "user-1".to_string(),
                    row_key: "a.png".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(result.status, 200);

        let media = container(&reopened);
        let content = reopened.download_blob(&media, "a.png").await.unwrap();
        assert_eq!(content, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let err = MemoryBackend::open(&path).await.unwrap_err();
        assert!(matches!(err, StowageError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_discards_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let backend = MemoryBackend::open(&path).await.unwrap();

        let table = backend.table_handle(&TableName::new("Uploads").unwrap());
        backend.create_table_if_absent(&table).await.unwrap();
        let media = container(&backend);
        backend.create_container_if_absent(&media).await.unwrap();

        // The staging file cannot be written while a directory holds its name
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        let batch = (0..3)
            .map(|i| EntityOperation::Insert(Entity::new("p", i.to_string())))
            .collect();
        assert!(backend.execute_batch(&table, batch).await.is_err());
        assert!(backend
            .execute(&table, EntityOperation::Insert(Entity::new("p", "single")))
            .await
            .is_err());
        for row_key in ["0", "single"] {
            let result = backend
                .execute(
                    &table,
                    EntityOperation::Retrieve {
                        partition_key: "p".to_string(),
                        row_key: row_key.to_string(),
                    },
                )
                .await
                .unwrap();
            assert!(result.is_not_found());
        }

        let other = backend.table_handle(&TableName::new("Other").unwrap());
        assert!(backend.create_table_if_absent(&other).await.is_err());
        assert!(!backend.table_exists(&other).await.unwrap());

        assert!(backend.upload_blob(&media, "a.png", vec![1]).await.is_err());
        assert!(!backend.blob_exists(&media, "a.png").await.unwrap());

        // Once writes succeed again the same batch commits cleanly
        std::fs::remove_dir(path.with_extension("tmp")).unwrap();
        let batch = (0..3)
            .map(|i| EntityOperation::Insert(Entity::new("p", i.to_string())))
            .collect();
        let results = backend.execute_batch(&table, batch).await.unwrap();
        assert_eq!(results.len(), 3);
    }
}
