//! In-memory storage backend for tests and local runs.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::{ObjectStorage, StorageError, StorageResult};

/// Object store backed by a process-local map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object contents, for test assertions.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<String> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(key.to_string())
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(())
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        if !self.has_object(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!(
            "memory://{}?expires_in={}",
            key,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.has_object(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_roundtrip() {
        let storage = MemoryStorage::new();
        let key = storage
            .upload("photos/a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(key, "photos/a.jpg");
        assert_eq!(storage.download(&key).await.unwrap(), b"jpeg");
        assert!(storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.download("photos/missing.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let storage = MemoryStorage::new();
        storage
            .upload("photos/a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        storage.delete("photos/a.jpg").await.unwrap();
        assert!(!storage.has_object("photos/a.jpg"));
        assert!(storage.delete("photos/a.jpg").await.is_err());
    }

    #[tokio::test]
    async fn test_presigned_url_requires_object() {
        let storage = MemoryStorage::new();
        assert!(storage
            .presigned_url("photos/a.jpg", Duration::from_secs(60))
            .await
            .is_err());

        storage
            .upload("photos/a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        let url = storage
            .presigned_url("photos/a.jpg", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.contains("photos/a.jpg"));
    }
}
