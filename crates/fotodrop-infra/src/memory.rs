//! In-memory repository implementations.
//!
//! Reference implementations of the repository contracts, used by tests
//! and local runs. The map mutex is what serializes concurrent updates to
//! the same aggregate id; a production deployment substitutes a database-
//! backed implementation with the same guarantee.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fotodrop_core::{
    JobId, JobMutation, Photo, PhotoId, PhotoRepository, RepositoryError, RepositoryResult,
    UploadEvent, UploadJob, UploadJobRepository,
};

#[derive(Clone, Default)]
pub struct InMemoryPhotoRepository {
    photos: Arc<Mutex<HashMap<PhotoId, Photo>>>,
}

impl InMemoryPhotoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photo_count(&self) -> usize {
        self.photos.lock().unwrap().len()
    }
}

#[async_trait]
impl PhotoRepository for InMemoryPhotoRepository {
    async fn save(&self, photo: &Photo) -> RepositoryResult<()> {
        // Stored state never carries pending events; draining them is the
        // caller's job after this save returns.
        let mut stored = photo.clone();
        stored.take_events();
        self.photos.lock().unwrap().insert(photo.id(), stored);
        Ok(())
    }

    async fn find(&self, id: PhotoId) -> RepositoryResult<Option<Photo>> {
        Ok(self.photos.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUploadJobRepository {
    jobs: Arc<Mutex<HashMap<JobId, UploadJob>>>,
}

impl InMemoryUploadJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadJobRepository for InMemoryUploadJobRepository {
    async fn save(&self, job: &UploadJob) -> RepositoryResult<()> {
        let mut stored = job.clone();
        stored.take_events();
        self.jobs.lock().unwrap().insert(job.id(), stored);
        Ok(())
    }

    async fn find(&self, id: JobId) -> RepositoryResult<Option<UploadJob>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn update(
        &self,
        id: JobId,
        mutate: JobMutation,
    ) -> RepositoryResult<(UploadJob, Vec<UploadEvent>)> {
        let mut jobs = self.jobs.lock().unwrap();
        let stored = jobs
            .get(&id)
            .ok_or(RepositoryError::JobNotFound(id))?;

        // Mutate a working copy so a rejected mutation leaves the stored
        // aggregate untouched.
        let mut working = stored.clone();
        mutate(&mut working)?;
        let events = working.take_events();
        jobs.insert(id, working.clone());
        Ok((working, events))
    }
}
