//! Storage connection factory
//!
//! This module turns a connection string into a [`StorageConnection`], the
//! long-lived session that hands out blob and table clients. It is the only
//! place that parses connection strings.

use crate::adapters::backend::options::RequestOptions;
use crate::adapters::backend::traits::{BlobBackend, TableBackend};
use crate::adapters::memory::MemoryBackend;
use crate::config::schema::StowageConfig;
use crate::core::blob::BlobStoreClient;
use crate::core::table::{TableStoreClient, MAX_BATCH_SIZE};
use crate::domain::{Result, StowageError};
use secrecy::ExposeSecret;
use std::sync::Arc;
use url::Url;

/// Connected storage session
///
/// Created once at startup; every client derived from it shares its backends
/// and request options. Clients derived separately keep separate reference
/// caches.
#[derive(Clone)]
pub struct StorageConnection {
    blobs: Arc<dyn BlobBackend>,
    tables: Arc<dyn TableBackend>,
    options: RequestOptions,
    max_batch_size: usize,
}

impl StorageConnection {
    /// Opens a connection from a connection string
    ///
    /// Supported forms:
    /// - `memory://` - volatile in-process emulator
    /// - `file:///path/to/store.json` - emulator persisted to a snapshot file
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed or unsupported connection
    /// strings, or an error if the snapshot file cannot be loaded.
    pub async fn open(connection_string: &str) -> Result<Self> {
        let url = Url::parse(connection_string.trim()).map_err(|e| {
            StowageError::Configuration(format!("Invalid storage connection string: {e}"))
        })?;

        match url.scheme() {
            "memory" => {
                tracing::info!("Creating volatile in-memory storage backend");
                Ok(Self::from_backend(Arc::new(MemoryBackend::new())))
            }
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    StowageError::Configuration(
                        "File connection string must hold an absolute path".to_string(),
                    )
                })?;
                tracing::info!(path = %path.display(), "Opening file-backed storage backend");
                let backend = MemoryBackend::open(path).await?;
                Ok(Self::from_backend(Arc::new(backend)))
            }
            other => Err(StowageError::Configuration(format!(
                "Unsupported storage scheme '{other}'. Must be one of: memory, file"
            ))),
        }
    }

    /// Opens a connection from the loaded configuration
    ///
    /// Applies the configured request timeout and batch size.
    pub async fn from_config(config: &StowageConfig) -> Result<Self> {
        let connection_string = config.storage.connection_string.expose_secret();
        let mut options = RequestOptions::new();
        if let Some(timeout) = config.storage.request_timeout() {
            options = options.with_timeout(timeout);
        }

        Ok(Self::open(connection_string.as_str())
            .await?
            .with_request_options(options)
            .with_max_batch_size(config.table.max_batch_size))
    }

    /// Wraps a backend serving both blobs and tables
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: BlobBackend + TableBackend + 'static,
    {
        Self::from_backends(backend.clone(), backend)
    }

    /// Wraps separate blob and table backends
    pub fn from_backends(blobs: Arc<dyn BlobBackend>, tables: Arc<dyn TableBackend>) -> Self {
        Self {
            blobs,
            tables,
            options: RequestOptions::default(),
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Sets the options applied to every backend call of derived clients
    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the chunk size of derived table clients
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Request options applied by derived clients
    pub fn request_options(&self) -> &RequestOptions {
        &self.options
    }

    /// Creates a blob client with its own container cache
    pub fn blob_client(&self) -> BlobStoreClient {
        BlobStoreClient::new(self.blobs.clone()).with_request_options(self.options.clone())
    }

    /// Creates a table client with its own table cache
    pub fn table_client(&self) -> TableStoreClient {
        TableStoreClient::new(self.tables.clone())
            .with_request_options(self.options.clone())
            .with_max_batch_size(self.max_batch_size)
    }
}

impl std::fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConnection")
            .field("options", &self.options)
            .field("max_batch_size", &self.max_batch_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_memory() {
        let connection = StorageConnection::open("memory://").await.unwrap();
        let client = connection.table_client();
        assert_eq!(client.max_batch_size(), MAX_BATCH_SIZE);
    }

    #[tokio::test]
    async fn test_open_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let url = Url::from_file_path(&path).unwrap();

        let connection = StorageConnection::open(url.as_str()).await.unwrap();
        let table = connection
            .table_client()
            .table("Uploads", true)
            .await
            .unwrap();
        assert!(table.uri().starts_with("file://"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_open_rejects_unknown_scheme() {
        let err = StorageConnection::open("https://account.blob.example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StowageError::Configuration(_)));
        assert!(err.to_string().contains("Unsupported storage scheme"));
    }

    #[tokio::test]
    async fn test_open_rejects_garbage() {
        let err = StorageConnection::open("not a connection string")
            .await
            .unwrap_err();
        assert!(matches!(err, StowageError::Configuration(_)));
    }
}
