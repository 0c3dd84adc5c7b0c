//! Shared test backend
//!
//! [`RecordingBackend`] wraps the in-memory emulator, counts the calls the
//! clients make and can be told to fail or stall specific calls.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stowage::adapters::backend::traits::{
    BlobBackend, BlobHandle, BlobProperties, ContainerHandle, QuerySegment, TableBackend,
    TableHandle,
};
use stowage::adapters::backend::StorageConnection;
use stowage::adapters::memory::MemoryBackend;
use stowage::domain::{
    ContainerName, ContinuationToken, EntityOperation, Result, StorageError, TableName,
    TableQuery, TableResult,
};

#[derive(Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,

    pub container_exists_calls: AtomicUsize,
    pub create_container_calls: AtomicUsize,
    pub table_exists_calls: AtomicUsize,
    pub create_table_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub set_properties_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub replace_calls: AtomicUsize,
    pub query_calls: AtomicUsize,

    /// Operation count of every batch call, in submission order
    pub batch_sizes: Mutex<Vec<usize>>,

    /// Zero-based index of the batch call that fails with status 500
    fail_batch_at: Mutex<Option<usize>>,

    /// Delay applied to existence checks and batch calls
    latency: Mutex<Option<Duration>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_batch(index: usize) -> Arc<Self> {
        let backend = Self::default();
        *backend.fail_batch_at.lock().unwrap() = Some(index);
        Arc::new(backend)
    }

    pub fn slow(latency: Duration) -> Arc<Self> {
        let backend = Self::default();
        *backend.latency.lock().unwrap() = Some(latency);
        Arc::new(backend)
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    async fn stall(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

/// Connection serving both clients from one recording backend
pub fn connection(backend: &Arc<RecordingBackend>) -> StorageConnection {
    StorageConnection::from_backend(backend.clone())
}

#[async_trait]
impl BlobBackend for RecordingBackend {
    fn container_handle(&self, name: &ContainerName) -> ContainerHandle {
        self.inner.container_handle(name)
    }

    async fn container_exists(&self, container: &ContainerHandle) -> Result<bool> {
        self.container_exists_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        self.inner.container_exists(container).await
    }

    async fn create_container_if_absent(&self, container: &ContainerHandle) -> Result<bool> {
        self.create_container_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_container_if_absent(container).await
    }

    async fn blob_exists(&self, container: &ContainerHandle, name: &str) -> Result<bool> {
        self.inner.blob_exists(container, name).await
    }

    async fn upload_blob(
        &self,
        container: &ContainerHandle,
        name: &str,
        content: Vec<u8>,
    ) -> Result<BlobHandle> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.upload_blob(container, name, content).await
    }

    async fn download_blob(&self, container: &ContainerHandle, name: &str) -> Result<Vec<u8>> {
        self.inner.download_blob(container, name).await
    }

    async fn set_blob_properties(
        &self,
        blob: &BlobHandle,
        properties: &BlobProperties,
    ) -> Result<()> {
        self.set_properties_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_blob_properties(blob, properties).await
    }

    async fn blob_properties(&self, blob: &BlobHandle) -> Result<BlobProperties> {
        self.inner.blob_properties(blob).await
    }

    async fn delete_blob(&self, blob: &BlobHandle) -> Result<bool> {
        self.inner.delete_blob(blob).await
    }
}

#[async_trait]
impl TableBackend for RecordingBackend {
    fn table_handle(&self, name: &TableName) -> TableHandle {
        self.inner.table_handle(name)
    }

    async fn table_exists(&self, table: &TableHandle) -> Result<bool> {
        self.table_exists_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        self.inner.table_exists(table).await
    }

    async fn create_table_if_absent(&self, table: &TableHandle) -> Result<bool> {
        self.create_table_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_table_if_absent(table).await
    }

    async fn execute(
        &self,
        table: &TableHandle,
        operation: EntityOperation,
    ) -> Result<TableResult> {
        match operation {
            EntityOperation::Delete(_) => {
                self.delete_calls.fetch_add(1, Ordering::SeqCst);
            }
            EntityOperation::Replace(_) => {
                self.replace_calls.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
        self.inner.execute(table, operation).await
    }

    async fn execute_batch(
        &self,
        table: &TableHandle,
        operations: Vec<EntityOperation>,
    ) -> Result<Vec<TableResult>> {
        let index = {
            let mut sizes = self.batch_sizes.lock().unwrap();
            sizes.push(operations.len());
            sizes.len() - 1
        };
        self.stall().await;

        let fail_at = *self.fail_batch_at.lock().unwrap();
        if fail_at == Some(index) {
            return Err(StorageError::backend(500, "Injected batch failure").into());
        }
        self.inner.execute_batch(table, operations).await
    }

    async fn execute_query_segment(
        &self,
        table: &TableHandle,
        query: &TableQuery,
        token: Option<&ContinuationToken>,
    ) -> Result<QuerySegment> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute_query_segment(table, query, token).await
    }
}
