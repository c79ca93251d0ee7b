//! Temporary staging area for raw upload bytes.

use bytes::Bytes;
use fotodrop_core::PhotoId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Holds raw bytes between request intake and the async pipeline.
///
/// Safe for concurrent use from the request path and the worker pool;
/// entries are removed once the pipeline finishes with a photo, whatever
/// the outcome. Construct one per scope (application or test) and inject
/// it — there is no global instance.
#[derive(Clone, Default)]
pub struct StagingArea {
    entries: Arc<Mutex<HashMap<PhotoId, Bytes>>>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, photo_id: PhotoId, data: Bytes) {
        self.entries.lock().unwrap().insert(photo_id, data);
    }

    pub fn retrieve(&self, photo_id: PhotoId) -> Option<Bytes> {
        self.entries.lock().unwrap().get(&photo_id).cloned()
    }

    pub fn remove(&self, photo_id: PhotoId) {
        self.entries.lock().unwrap().remove(&photo_id);
    }

    pub fn exists(&self, photo_id: PhotoId) -> bool {
        self.entries.lock().unwrap().contains_key(&photo_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_retrieve_remove() {
        let staging = StagingArea::new();
        let id = PhotoId::new();

        assert!(!staging.exists(id));
        staging.store(id, Bytes::from_static(b"raw"));
        assert!(staging.exists(id));
        assert_eq!(staging.retrieve(id).unwrap(), Bytes::from_static(b"raw"));

        staging.remove(id);
        assert!(staging.retrieve(id).is_none());
        assert!(staging.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let staging = StagingArea::new();
        let id = PhotoId::new();
        staging.remove(id);
        staging.store(id, Bytes::from_static(b"raw"));
        staging.remove(id);
        staging.remove(id);
        assert!(staging.is_empty());
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = StagingArea::new();
        let b = StagingArea::new();
        let id = PhotoId::new();
        a.store(id, Bytes::from_static(b"raw"));
        assert!(!b.exists(id));
    }
}
