//! Per-photo upload pipeline.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;

use fotodrop_core::{
    DomainError, Filename, Photo, PhotoId, PhotoRepository, RepositoryError, UploadJobRepository,
};
use fotodrop_infra::{EventBus, StagingArea};
use fotodrop_storage::ObjectStorage;

pub const STAGING_MISS_MESSAGE: &str = "staged upload bytes are missing";
pub const QUEUE_FULL_MESSAGE: &str = "upload queue is full";

/// Storage key partition for original photo uploads.
const KEY_PREFIX: &str = "photos";

#[derive(Clone, Copy)]
enum PhotoOutcome {
    Completed,
    Failed,
}

/// Drives a single photo from staged bytes to durable storage.
///
/// One processor run owns its photo end-to-end, which is what keeps
/// per-photo transitions strictly ordered. Storage failures are absorbed
/// into the Failed state; they never crash the worker, and they are never
/// retried here — retry is an explicit command.
pub struct UploadProcessor {
    photos: Arc<dyn PhotoRepository>,
    jobs: Arc<dyn UploadJobRepository>,
    staging: StagingArea,
    storage: Arc<dyn ObjectStorage>,
    bus: EventBus,
    upload_timeout: Duration,
}

impl UploadProcessor {
    pub fn new(
        photos: Arc<dyn PhotoRepository>,
        jobs: Arc<dyn UploadJobRepository>,
        staging: StagingArea,
        storage: Arc<dyn ObjectStorage>,
        bus: EventBus,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            photos,
            jobs,
            staging,
            storage,
            bus,
            upload_timeout,
        }
    }

    /// Durable key derived from the photo id and original extension, so a
    /// retried photo lands on the same key.
    pub fn storage_key(photo_id: PhotoId, filename: &Filename) -> String {
        match filename.extension() {
            Some(ext) => format!("{KEY_PREFIX}/{photo_id}.{ext}"),
            None => format!("{KEY_PREFIX}/{photo_id}"),
        }
    }

    /// Runs the pipeline for one photo. Unexpected faults are caught here:
    /// the photo is best-effort failed and the staging entry is always
    /// cleared so staged bytes cannot accumulate.
    #[tracing::instrument(skip(self), fields(photo_id = %photo_id))]
    pub async fn process(&self, photo_id: PhotoId) {
        if let Err(err) = self.run(photo_id).await {
            tracing::error!(error = %err, photo_id = %photo_id, "upload pipeline aborted");
            self.fail_best_effort(photo_id, &err.to_string()).await;
        }
        self.staging.remove(photo_id);
    }

    /// Rejects a photo that never reached the pipeline (e.g. the work
    /// queue was full), recording the failure and releasing staged bytes.
    pub async fn reject(&self, photo_id: PhotoId, reason: &str) {
        tracing::warn!(photo_id = %photo_id, reason, "rejecting queued upload");
        self.fail_best_effort(photo_id, reason).await;
        self.staging.remove(photo_id);
    }

    async fn run(&self, photo_id: PhotoId) -> Result<()> {
        let mut photo = self
            .photos
            .find(photo_id)
            .await?
            .ok_or_else(|| anyhow!("photo {photo_id} not found"))?;

        photo.mark_as_uploading()?;
        self.persist_photo(&mut photo).await?;

        let Some(data) = self.staging.retrieve(photo_id) else {
            // The bytes exist nowhere else; this is terminal, not retried.
            tracing::warn!(photo_id = %photo_id, "staging miss, failing upload");
            return self.finish(&mut photo, PhotoOutcome::Failed, STAGING_MISS_MESSAGE).await;
        };

        let key = Self::storage_key(photo.id(), photo.filename());
        let size = data.len();
        let put = tokio::time::timeout(
            self.upload_timeout,
            self.storage.upload(&key, data, photo.content_type().as_str()),
        )
        .await;

        match put {
            Ok(Ok(stored_key)) => {
                tracing::info!(
                    photo_id = %photo_id,
                    storage_key = %stored_key,
                    size_bytes = size,
                    "photo stored durably"
                );
                self.finish(&mut photo, PhotoOutcome::Completed, &stored_key).await
            }
            Ok(Err(err)) => {
                tracing::warn!(photo_id = %photo_id, error = %err, "storage upload failed");
                self.finish(&mut photo, PhotoOutcome::Failed, &err.to_string())
                    .await
            }
            Err(_) => {
                tracing::warn!(
                    photo_id = %photo_id,
                    timeout_seconds = self.upload_timeout.as_secs(),
                    "storage upload timed out"
                );
                self.finish(&mut photo, PhotoOutcome::Failed, "storage upload timed out")
                    .await
            }
        }
    }

    async fn finish(
        &self,
        photo: &mut Photo,
        outcome: PhotoOutcome,
        detail: &str,
    ) -> Result<()> {
        match outcome {
            PhotoOutcome::Completed => photo.mark_as_completed(detail)?,
            PhotoOutcome::Failed => photo.mark_as_failed(detail)?,
        }
        self.persist_photo(photo).await?;
        self.staging.remove(photo.id());
        self.notify_job(photo, outcome).await
    }

    async fn persist_photo(&self, photo: &mut Photo) -> Result<()> {
        self.photos.save(photo).await?;
        self.bus.publish_all(photo.take_events());
        Ok(())
    }

    async fn notify_job(&self, photo: &Photo, outcome: PhotoOutcome) -> Result<()> {
        let Some(job_id) = photo.job_id() else {
            return Ok(());
        };
        let photo_id = photo.id();
        let result = self
            .jobs
            .update(
                job_id,
                Box::new(move |job| match outcome {
                    PhotoOutcome::Completed => job.mark_photo_completed(photo_id),
                    PhotoOutcome::Failed => job.mark_photo_failed(photo_id),
                }),
            )
            .await;
        match result {
            Ok((_job, events)) => {
                self.bus.publish_all(events);
                Ok(())
            }
            // A retried photo can finish after its job already settled;
            // the job counters are final at that point.
            Err(RepositoryError::Domain(DomainError::JobFinalized(status))) => {
                tracing::warn!(
                    photo_id = %photo_id,
                    job_id = %job_id,
                    job_status = %status,
                    "photo finished after its job was finalized"
                );
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Last-resort failure recording; every error here is logged and
    /// swallowed so the staging cleanup still runs.
    async fn fail_best_effort(&self, photo_id: PhotoId, reason: &str) {
        let photo = match self.photos.find(photo_id).await {
            Ok(Some(photo)) => photo,
            Ok(None) => return,
            Err(err) => {
                tracing::error!(photo_id = %photo_id, error = %err, "could not load photo to record failure");
                return;
            }
        };

        let mut photo = photo;
        if photo.mark_as_failed(reason).is_err() {
            // Already terminal; nothing to record.
            return;
        }
        if let Err(err) = self.photos.save(&photo).await {
            tracing::error!(photo_id = %photo_id, error = %err, "could not persist failure state");
            return;
        }
        self.bus.publish_all(photo.take_events());
        if let Err(err) = self.notify_job(&photo, PhotoOutcome::Failed).await {
            tracing::error!(photo_id = %photo_id, error = %err, "could not record job failure");
        }
    }
}
