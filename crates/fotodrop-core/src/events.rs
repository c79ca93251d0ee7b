//! Domain events raised by the upload aggregates.
//!
//! Events are immutable records buffered on the aggregate that raised them
//! and drained exactly once by infrastructure after a successful save.
//! `UploadEvent` is the tagged union carried by the in-process event bus;
//! consumers match on the variants they handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{JobId, PhotoId, UserId};

/// A photo entered the queue and is ready for the upload pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoUploadStarted {
    pub photo_id: PhotoId,
    pub uploaded_by: UserId,
    pub job_id: Option<JobId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoUploadProgressed {
    pub photo_id: PhotoId,
    pub percentage: u8,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoUploadCompleted {
    pub photo_id: PhotoId,
    pub storage_key: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoUploadFailed {
    pub photo_id: PhotoId,
    pub error_message: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJobCreated {
    pub job_id: JobId,
    pub user_id: UserId,
    pub total_photos: u32,
    pub occurred_at: DateTime<Utc>,
}

/// A member photo finished (either way) and the batch counters moved.
///
/// `percentage` is the share of photos processed so far (completed plus
/// failed), which is what a live progress bar renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJobProgressed {
    pub job_id: JobId,
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
    pub percentage: u8,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJobCompleted {
    pub job_id: JobId,
    pub total_photos: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJobFailed {
    pub job_id: JobId,
    pub error_message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Tagged union of every domain event carried by the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadEvent {
    PhotoUploadStarted(PhotoUploadStarted),
    PhotoUploadProgressed(PhotoUploadProgressed),
    PhotoUploadCompleted(PhotoUploadCompleted),
    PhotoUploadFailed(PhotoUploadFailed),
    UploadJobCreated(UploadJobCreated),
    UploadJobProgressed(UploadJobProgressed),
    UploadJobCompleted(UploadJobCompleted),
    UploadJobFailed(UploadJobFailed),
}

impl UploadEvent {
    /// Event type name, used for serialization routing and log fields.
    pub fn event_type(&self) -> &'static str {
        match self {
            UploadEvent::PhotoUploadStarted(_) => "photo_upload_started",
            UploadEvent::PhotoUploadProgressed(_) => "photo_upload_progressed",
            UploadEvent::PhotoUploadCompleted(_) => "photo_upload_completed",
            UploadEvent::PhotoUploadFailed(_) => "photo_upload_failed",
            UploadEvent::UploadJobCreated(_) => "upload_job_created",
            UploadEvent::UploadJobProgressed(_) => "upload_job_progressed",
            UploadEvent::UploadJobCompleted(_) => "upload_job_completed",
            UploadEvent::UploadJobFailed(_) => "upload_job_failed",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UploadEvent::PhotoUploadStarted(e) => e.occurred_at,
            UploadEvent::PhotoUploadProgressed(e) => e.occurred_at,
            UploadEvent::PhotoUploadCompleted(e) => e.occurred_at,
            UploadEvent::PhotoUploadFailed(e) => e.occurred_at,
            UploadEvent::UploadJobCreated(e) => e.occurred_at,
            UploadEvent::UploadJobProgressed(e) => e.occurred_at,
            UploadEvent::UploadJobCompleted(e) => e.occurred_at,
            UploadEvent::UploadJobFailed(e) => e.occurred_at,
        }
    }
}

impl From<PhotoUploadStarted> for UploadEvent {
    fn from(e: PhotoUploadStarted) -> Self {
        UploadEvent::PhotoUploadStarted(e)
    }
}

impl From<PhotoUploadProgressed> for UploadEvent {
    fn from(e: PhotoUploadProgressed) -> Self {
        UploadEvent::PhotoUploadProgressed(e)
    }
}

impl From<PhotoUploadCompleted> for UploadEvent {
    fn from(e: PhotoUploadCompleted) -> Self {
        UploadEvent::PhotoUploadCompleted(e)
    }
}

impl From<PhotoUploadFailed> for UploadEvent {
    fn from(e: PhotoUploadFailed) -> Self {
        UploadEvent::PhotoUploadFailed(e)
    }
}

impl From<UploadJobCreated> for UploadEvent {
    fn from(e: UploadJobCreated) -> Self {
        UploadEvent::UploadJobCreated(e)
    }
}

impl From<UploadJobProgressed> for UploadEvent {
    fn from(e: UploadJobProgressed) -> Self {
        UploadEvent::UploadJobProgressed(e)
    }
}

impl From<UploadJobCompleted> for UploadEvent {
    fn from(e: UploadJobCompleted) -> Self {
        UploadEvent::UploadJobCompleted(e)
    }
}

impl From<UploadJobFailed> for UploadEvent {
    fn from(e: UploadJobFailed) -> Self {
        UploadEvent::UploadJobFailed(e)
    }
}
