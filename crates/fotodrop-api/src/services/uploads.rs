//! Upload command service.
//!
//! The synchronous half of the upload flow: commands validate, persist the
//! queued state, and publish the resulting events. Everything past the
//! published `PhotoUploadStarted` runs on the worker pool; callers are
//! never blocked on the pipeline.

use bytes::Bytes;
use std::sync::Arc;

use fotodrop_core::config::UploadPolicy;
use fotodrop_core::{
    ContentType, DomainError, FileSize, Filename, JobId, Photo, PhotoId, PhotoRepository,
    UploadJob, UploadJobRepository, UserId,
};
use fotodrop_infra::{EventBus, StagingArea};

use crate::error::ApiError;

#[derive(Clone)]
pub struct UploadService {
    photos: Arc<dyn PhotoRepository>,
    jobs: Arc<dyn UploadJobRepository>,
    staging: StagingArea,
    bus: EventBus,
    policy: UploadPolicy,
}

#[derive(Debug)]
pub struct UploadPhotoCommand {
    pub user_id: UserId,
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
    pub job_id: Option<JobId>,
}

impl UploadService {
    pub fn new(
        photos: Arc<dyn PhotoRepository>,
        jobs: Arc<dyn UploadJobRepository>,
        staging: StagingArea,
        bus: EventBus,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            photos,
            jobs,
            staging,
            bus,
            policy,
        }
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn create_job(&self, user_id: UserId, total_photos: u32) -> Result<JobId, ApiError> {
        let mut job = UploadJob::create(JobId::new(), user_id, total_photos)?;
        self.jobs.save(&job).await?;
        self.bus.publish_all(job.take_events());

        tracing::info!(job_id = %job.id(), total_photos, "upload job created");
        Ok(job.id())
    }

    /// Accepts one photo: validates, attaches it to its job, stages the
    /// bytes, and persists the queued state. Returns as soon as
    /// `PhotoUploadStarted` is published.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, filename = %cmd.filename))]
    pub async fn upload_photo(&self, cmd: UploadPhotoCommand) -> Result<PhotoId, ApiError> {
        if cmd.data.len() > self.policy.max_file_size {
            return Err(ApiError::FileTooLarge {
                max: self.policy.max_file_size,
            });
        }
        let filename = Filename::new(cmd.filename)?;
        let size = FileSize::new(cmd.data.len() as u64)?;
        let content_type = ContentType::new(&cmd.content_type)?;
        let photo_id = PhotoId::new();

        // Attach to the job first so a full or foreign job rejects the
        // upload before anything is staged.
        if let Some(job_id) = cmd.job_id {
            let owner = cmd.user_id;
            let (_job, events) = self
                .jobs
                .update(
                    job_id,
                    Box::new(move |job| {
                        if job.user_id() != owner {
                            return Err(DomainError::NotOwner(owner));
                        }
                        job.add_photo(photo_id)
                    }),
                )
                .await?;
            self.bus.publish_all(events);
        }

        let mut photo = Photo::create(
            photo_id,
            filename,
            size,
            content_type,
            cmd.user_id,
            cmd.job_id,
        );
        self.staging.store(photo_id, cmd.data);
        self.photos.save(&photo).await?;
        self.bus.publish_all(photo.take_events());

        tracing::info!(photo_id = %photo_id, job_id = ?cmd.job_id, "photo queued for upload");
        Ok(photo_id)
    }

    /// Explicit retry of a failed photo. `data`, when given, re-stages the
    /// original bytes; without it the retry depends on bytes still being
    /// staged and otherwise fails terminally in the pipeline.
    #[tracing::instrument(skip(self, data), fields(photo_id = %photo_id, user_id = %user_id))]
    pub async fn retry_failed_upload(
        &self,
        photo_id: PhotoId,
        user_id: UserId,
        data: Option<Bytes>,
    ) -> Result<(), ApiError> {
        let mut photo = self
            .photos
            .find(photo_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("photo {photo_id}")))?;
        if photo.uploaded_by() != user_id {
            return Err(DomainError::NotOwner(user_id).into());
        }
        if let Some(ref data) = data {
            if data.len() > self.policy.max_file_size {
                return Err(ApiError::FileTooLarge {
                    max: self.policy.max_file_size,
                });
            }
        }

        photo.reset_for_retry(self.policy.max_retry_attempts)?;
        if let Some(data) = data {
            self.staging.store(photo_id, data);
        }
        self.photos.save(&photo).await?;
        self.bus.publish_all(photo.take_events());

        tracing::info!(photo_id = %photo_id, attempt = photo.retry_count(), "upload retry queued");
        Ok(())
    }

    pub async fn photo(&self, photo_id: PhotoId) -> Result<Photo, ApiError> {
        self.photos
            .find(photo_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("photo {photo_id}")))
    }

    pub async fn job(&self, job_id: JobId) -> Result<UploadJob, ApiError> {
        self.jobs
            .find(job_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("upload job {job_id}")))
    }
}
