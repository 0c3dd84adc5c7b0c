//! Blob store client
//!
//! [`BlobStoreClient`] resolves containers by name or handle, caches resolved
//! handles, and moves byte, text and JSON payloads in and out of blobs.
//!
//! # Example
//!
//! ```rust
//! use stowage::adapters::backend::StorageConnection;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = StorageConnection::open("memory://").await?;
//! let blobs = connection.blob_client();
//!
//! blobs.container("media", true).await?;
//! blobs.upload_text("media", "hello.txt", "hello", false).await?;
//! assert_eq!(blobs.download_text("media", "hello.txt").await?, "hello");
//!
//! // Existing content is kept unless overwrite is requested
//! let skipped = blobs.upload_text("media", "hello.txt", "bye", false).await?;
//! assert!(skipped.is_none());
//! # Ok(())
//! # }
//! ```

use crate::adapters::backend::options::RequestOptions;
use crate::adapters::backend::traits::{
    BlobBackend, BlobHandle, BlobProperties, ContainerHandle, JSON_CONTENT_TYPE,
};
use crate::core::cache::HandleCache;
use crate::domain::names::ContainerName;
use crate::domain::{Result, StorageError, StowageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;

/// Byte order mark some writers put in front of UTF-8 text
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Longest blob name the service accepts
const MAX_BLOB_NAME_LEN: usize = 1024;

/// A container given either by name or by an already resolved handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerRef {
    Name(String),
    Handle(ContainerHandle),
}

impl From<&str> for ContainerRef {
    fn from(name: &str) -> Self {
        ContainerRef::Name(name.to_string())
    }
}

impl From<String> for ContainerRef {
    fn from(name: String) -> Self {
        ContainerRef::Name(name)
    }
}

impl From<&String> for ContainerRef {
    fn from(name: &String) -> Self {
        ContainerRef::Name(name.clone())
    }
}

impl From<&ContainerName> for ContainerRef {
    fn from(name: &ContainerName) -> Self {
        ContainerRef::Name(name.to_string())
    }
}

impl From<ContainerHandle> for ContainerRef {
    fn from(handle: ContainerHandle) -> Self {
        ContainerRef::Handle(handle)
    }
}

impl From<&ContainerHandle> for ContainerRef {
    fn from(handle: &ContainerHandle) -> Self {
        ContainerRef::Handle(handle.clone())
    }
}

/// Client for blob containers
///
/// Cloning is cheap; clones share the backend and the container cache.
#[derive(Clone)]
pub struct BlobStoreClient {
    backend: Arc<dyn BlobBackend>,
    containers: Arc<HandleCache<ContainerHandle>>,
    options: RequestOptions,
}

impl BlobStoreClient {
    /// Creates a client with an empty container cache
    pub fn new(backend: Arc<dyn BlobBackend>) -> Self {
        Self {
            backend,
            containers: Arc::new(HandleCache::new()),
            options: RequestOptions::default(),
        }
    }

    /// Sets the options applied to every backend call
    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolves a container reference to a handle
    ///
    /// A handle is returned unchanged. A name is validated, then served from
    /// the cache or checked against the backend. An absent container is
    /// created when `create_if_absent` is set.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the container does not exist and was not created.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an invalid name, or the backend error if
    /// the existence check or the creation fails.
    pub async fn resolve_container(
        &self,
        reference: impl Into<ContainerRef>,
        create_if_absent: bool,
    ) -> Result<Option<ContainerHandle>> {
        let name = match reference.into() {
            ContainerRef::Handle(handle) => return Ok(Some(handle)),
            ContainerRef::Name(name) => {
                ContainerName::new(name).map_err(StorageError::InvalidArgument)?
            }
        };

        if let Some(handle) = self.containers.get(name.as_str()) {
            tracing::debug!(container = %name, "Container cache hit");
            return Ok(Some(handle));
        }

        self.containers
            .get_or_resolve(name.as_str(), || async {
                let handle = self.backend.container_handle(&name);
                if self
                    .options
                    .run(self.backend.container_exists(&handle))
                    .await?
                {
                    tracing::debug!(container = %name, "Resolved existing container");
                    return Ok(Some(handle));
                }

                if !create_if_absent {
                    tracing::debug!(container = %name, "Container does not exist");
                    return Ok(None);
                }

                let created = self
                    .options
                    .run(self.backend.create_container_if_absent(&handle))
                    .await?;
                tracing::info!(container = %name, created, "Created container");
                Ok(Some(handle))
            })
            .await
    }

    /// Resolves a container that must exist (or be created)
    ///
    /// # Errors
    ///
    /// Returns `ContainerNotFound` where [`resolve_container`](Self::resolve_container)
    /// returns `Ok(None)`.
    pub async fn container(
        &self,
        reference: impl Into<ContainerRef>,
        create_if_absent: bool,
    ) -> Result<ContainerHandle> {
        let reference = reference.into();
        let label = match reference {
            ContainerRef::Name(ref name) => name.clone(),
            ContainerRef::Handle(ref handle) => handle.name().to_string(),
        };

        self.resolve_container(reference, create_if_absent)
            .await?
            .ok_or_else(|| StorageError::ContainerNotFound(label).into())
    }

    /// Downloads a blob into an in-memory buffer positioned at the start
    ///
    /// # Errors
    ///
    /// Returns `ContainerNotFound` or `BlobNotFound` if either is missing.
    pub async fn download(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
    ) -> Result<Cursor<Vec<u8>>> {
        check_blob_name(blob_name)?;
        let container = self.container(container, false).await?;

        let content = self
            .options
            .run(self.backend.download_blob(&container, blob_name))
            .await?;

        tracing::debug!(
            container = %container.name(),
            blob = blob_name,
            bytes = content.len(),
            "Downloaded blob"
        );
        Ok(Cursor::new(content))
    }

    /// Downloads a blob and decodes it as UTF-8 text
    ///
    /// A leading byte order mark is dropped.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the content is not valid UTF-8.
    pub async fn download_text(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
    ) -> Result<String> {
        let mut content = self.download(container, blob_name).await?.into_inner();
        if content.starts_with(UTF8_BOM) {
            content.drain(..UTF8_BOM.len());
        }

        String::from_utf8(content).map_err(|e| {
            StowageError::Serialization(format!("Blob '{blob_name}' is not valid UTF-8: {e}"))
        })
    }

    /// Downloads a blob and parses it as JSON
    pub async fn download_json<T: DeserializeOwned>(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
    ) -> Result<T> {
        let text = self.download_text(container, blob_name).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Uploads bytes to a blob
    ///
    /// The container must exist. An existing blob is only replaced when
    /// `overwrite` is set.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the blob exists and `overwrite` is false; the
    /// stored content is left unchanged.
    pub async fn upload(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
        content: impl Into<Vec<u8>>,
        overwrite: bool,
    ) -> Result<Option<BlobHandle>> {
        check_blob_name(blob_name)?;
        let container = self.container(container, false).await?;

        let exists = self
            .options
            .run(self.backend.blob_exists(&container, blob_name))
            .await?;
        if exists && !overwrite {
            tracing::warn!(
                container = %container.name(),
                blob = blob_name,
                "Blob already exists, upload skipped"
            );
            return Ok(None);
        }

        let content = content.into();
        let bytes = content.len();
        let blob = self
            .options
            .run(self.backend.upload_blob(&container, blob_name, content))
            .await?;

        tracing::debug!(
            container = %container.name(),
            blob = blob_name,
            bytes,
            replaced = exists,
            "Uploaded blob"
        );
        Ok(Some(blob))
    }

    /// Uploads text as UTF-8
    pub async fn upload_text(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
        text: &str,
        overwrite: bool,
    ) -> Result<Option<BlobHandle>> {
        self.upload(container, blob_name, text.as_bytes(), overwrite)
            .await
    }

    /// Uploads a JSON document and marks it as `application/json`
    ///
    /// The content type is set after the upload; a skipped upload leaves the
    /// existing blob's properties untouched.
    pub async fn upload_json(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
        json: &str,
        overwrite: bool,
    ) -> Result<Option<BlobHandle>> {
        let Some(blob) = self
            .upload_text(container, blob_name, json, overwrite)
            .await?
        else {
            return Ok(None);
        };

        self.options
            .run(
                self.backend
                    .set_blob_properties(&blob, &BlobProperties::with_content_type(JSON_CONTENT_TYPE)),
            )
            .await?;
        Ok(Some(blob))
    }

    /// Serializes a value and uploads it as JSON
    pub async fn upload_json_value<T: Serialize>(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
        value: &T,
        overwrite: bool,
    ) -> Result<Option<BlobHandle>> {
        let json = serde_json::to_string(value)?;
        self.upload_json(container, blob_name, &json, overwrite)
            .await
    }

    /// Checks whether a blob exists
    pub async fn blob_exists(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
    ) -> Result<bool> {
        check_blob_name(blob_name)?;
        let container = self.container(container, false).await?;
        self.options
            .run(self.backend.blob_exists(&container, blob_name))
            .await
    }

    /// Reads the properties of a blob
    pub async fn properties(
        &self,
        container: impl Into<ContainerRef>,
        blob_name: &str,
    ) -> Result<BlobProperties> {
        check_blob_name(blob_name)?;
        let container = self.container(container, false).await?;
        let blob = BlobHandle::new(container, blob_name);
        self.options.run(self.backend.blob_properties(&blob)).await
    }

    /// Deletes a blob
    ///
    /// # Returns
    ///
    /// Returns `true` if a blob was deleted, `false` if it did not exist.
    pub async fn delete(&self, container: impl Into<ContainerRef>, blob_name: &str) -> Result<bool> {
        check_blob_name(blob_name)?;
        let container = self.container(container, false).await?;
        let blob = BlobHandle::new(container, blob_name);
        let deleted = self.options.run(self.backend.delete_blob(&blob)).await?;
        tracing::debug!(blob = %blob.uri(), deleted, "Deleted blob");
        Ok(deleted)
    }

    /// Number of containers held in the cache
    pub fn cached_containers(&self) -> usize {
        self.containers.len()
    }
}

impl std::fmt::Debug for BlobStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreClient")
            .field("cached_containers", &self.containers.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn check_blob_name(blob_name: &str) -> Result<()> {
    if blob_name.trim().is_empty() {
        return Err(StorageError::invalid_argument("Blob name must not be empty").into());
    }
    if blob_name.chars().count() > MAX_BLOB_NAME_LEN {
        return Err(StorageError::invalid_argument(format!(
            "Blob name exceeds {MAX_BLOB_NAME_LEN} characters"
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryBackend;

    fn client() -> BlobStoreClient {
        BlobStoreClient::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn test_container_ref_conversions() {
        assert_eq!(
            ContainerRef::from("media"),
            ContainerRef::Name("media".to_string())
        );
        let handle = ContainerHandle::new(ContainerName::new("media").unwrap(), "memory://x");
        assert_eq!(ContainerRef::from(&handle), ContainerRef::Handle(handle));
    }

    #[test]
    fn test_check_blob_name() {
        assert!(check_blob_name("a/b/c.txt").is_ok());
        assert!(check_blob_name("  ").is_err());
        assert!(check_blob_name(&"x".repeat(MAX_BLOB_NAME_LEN + 1)).is_err());
    }

    #[tokio::test]
    async fn test_handle_is_returned_unchanged() {
        let client = client();
        let handle = ContainerHandle::new(ContainerName::new("never-created").unwrap(), "custom://h");
        let resolved = client.resolve_container(&handle, false).await.unwrap();
        assert_eq!(resolved, Some(handle));
        assert_eq!(client.cached_containers(), 0);
    }

    #[tokio::test]
    async fn test_invalid_name_is_rejected() {
        let err = client()
            .resolve_container("Not_Valid", true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StowageError::Storage(StorageError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_download_text_strips_bom() {
        let client = client();
        client.container("docs", true).await.unwrap();
        let mut content = UTF8_BOM.to_vec();
        content.extend_from_slice("héllo".as_bytes());
        client.upload("docs", "a.txt", content, false).await.unwrap();

        assert_eq!(client.download_text("docs", "a.txt").await.unwrap(), "héllo");
    }

    #[tokio::test]
    async fn test_download_text_rejects_invalid_utf8() {
        let client = client();
        client.container("docs", true).await.unwrap();
        client
            .upload("docs", "bad.bin", vec![0xff, 0xfe, 0x00], false)
            .await
            .unwrap();

        let err = client.download_text("docs", "bad.bin").await.unwrap_err();
        assert!(matches!(err, StowageError::Serialization(_)));
    }
}
