//! Storage gateway contract and error types.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("storage backend error: {0}")]
    BackendError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable object store consumed by the upload pipeline.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Writes the object under `key` and returns the key on success.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Time-limited URL for direct client access to a stored object.
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
