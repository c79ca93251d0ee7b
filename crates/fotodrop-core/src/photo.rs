//! The `Photo` entity: a single upload's state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::DomainError;
use crate::events::{
    PhotoUploadCompleted, PhotoUploadFailed, PhotoUploadProgressed, PhotoUploadStarted,
    UploadEvent,
};
use crate::ids::{JobId, PhotoId, UserId};
use crate::values::{ContentType, FileSize, Filename};

/// Lifecycle status of a single photo upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Queued,
    Uploading,
    Completed,
    Failed,
    Cancelled,
}

impl UploadStatus {
    /// Completed and Cancelled admit no further transition; Failed stays
    /// retry-eligible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        use UploadStatus::*;
        matches!(
            (self, next),
            (Queued, Uploading)
                | (Queued, Failed)
                | (Queued, Cancelled)
                | (Uploading, Completed)
                | (Uploading, Failed)
                | (Uploading, Cancelled)
                | (Failed, Queued)
                | (Failed, Failed)
                | (Failed, Cancelled)
        )
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStatus::Queued => "queued",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
            UploadStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A single photo upload.
///
/// All mutation goes through the transition methods below; a completed
/// photo always carries a non-empty storage key, and a photo that is still
/// uploading never does.
#[derive(Debug, Clone)]
pub struct Photo {
    id: PhotoId,
    filename: Filename,
    size: FileSize,
    content_type: ContentType,
    status: UploadStatus,
    storage_key: Option<String>,
    thumbnail_key: Option<String>,
    uploaded_by: UserId,
    job_id: Option<JobId>,
    created_at: DateTime<Utc>,
    uploaded_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    retry_count: u32,
    metadata: HashMap<String, serde_json::Value>,
    events: Vec<UploadEvent>,
}

impl Photo {
    /// Creates a queued photo and raises `PhotoUploadStarted`.
    ///
    /// Scalar validation happens when the `Filename`/`FileSize`/`ContentType`
    /// arguments are constructed; no invalid photo can be created.
    pub fn create(
        id: PhotoId,
        filename: Filename,
        size: FileSize,
        content_type: ContentType,
        uploaded_by: UserId,
        job_id: Option<JobId>,
    ) -> Self {
        let mut photo = Self {
            id,
            filename,
            size,
            content_type,
            status: UploadStatus::Queued,
            storage_key: None,
            thumbnail_key: None,
            uploaded_by,
            job_id,
            created_at: Utc::now(),
            uploaded_at: None,
            last_error: None,
            retry_count: 0,
            metadata: HashMap::new(),
            events: Vec::new(),
        };
        photo.raise(
            PhotoUploadStarted {
                photo_id: id,
                uploaded_by,
                job_id,
                occurred_at: Utc::now(),
            }
            .into(),
        );
        photo
    }

    /// Queued → Uploading; raises a zero-percent progress event.
    pub fn mark_as_uploading(&mut self) -> Result<(), DomainError> {
        self.transition(UploadStatus::Uploading)?;
        self.raise(
            PhotoUploadProgressed {
                photo_id: self.id,
                percentage: 0,
                occurred_at: Utc::now(),
            }
            .into(),
        );
        Ok(())
    }

    /// Reports upload progress; only legal while Uploading.
    pub fn update_progress(&mut self, percentage: u8) -> Result<(), DomainError> {
        if self.status != UploadStatus::Uploading {
            return Err(DomainError::ProgressNotAllowed(self.status));
        }
        if percentage > 100 {
            return Err(DomainError::ProgressOutOfRange(percentage));
        }
        self.raise(
            PhotoUploadProgressed {
                photo_id: self.id,
                percentage,
                occurred_at: Utc::now(),
            }
            .into(),
        );
        Ok(())
    }

    /// Uploading → Completed; records the durable storage key.
    pub fn mark_as_completed(&mut self, storage_key: &str) -> Result<(), DomainError> {
        if storage_key.is_empty() {
            return Err(DomainError::EmptyStorageKey);
        }
        self.transition(UploadStatus::Completed)?;
        self.storage_key = Some(storage_key.to_string());
        self.uploaded_at = Some(Utc::now());
        self.last_error = None;
        self.raise(
            PhotoUploadCompleted {
                photo_id: self.id,
                storage_key: storage_key.to_string(),
                occurred_at: Utc::now(),
            }
            .into(),
        );
        Ok(())
    }

    /// Fails the upload. Legal from Queued (pre-flight failures), Uploading,
    /// and Failed; disallowed once Completed or Cancelled.
    pub fn mark_as_failed(&mut self, message: &str) -> Result<(), DomainError> {
        self.transition(UploadStatus::Failed)?;
        self.last_error = Some(message.to_string());
        self.raise(
            PhotoUploadFailed {
                photo_id: self.id,
                error_message: message.to_string(),
                occurred_at: Utc::now(),
            }
            .into(),
        );
        Ok(())
    }

    /// Failed → Queued, bounded by `max_attempts`; re-raises
    /// `PhotoUploadStarted` so the pipeline picks the photo up again.
    pub fn reset_for_retry(&mut self, max_attempts: u32) -> Result<(), DomainError> {
        if self.status == UploadStatus::Failed && self.retry_count >= max_attempts {
            return Err(DomainError::RetryLimitReached { max_attempts });
        }
        self.transition(UploadStatus::Queued)?;
        self.retry_count += 1;
        self.raise(
            PhotoUploadStarted {
                photo_id: self.id,
                uploaded_by: self.uploaded_by,
                job_id: self.job_id,
                occurred_at: Utc::now(),
            }
            .into(),
        );
        Ok(())
    }

    /// Cancels the upload. Disallowed once Completed; a second cancel is a
    /// no-op. No event is raised.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == UploadStatus::Cancelled {
            return Ok(());
        }
        self.transition(UploadStatus::Cancelled)
    }

    /// Records the thumbnail key; only meaningful once the original is
    /// durably stored.
    pub fn attach_thumbnail(&mut self, thumbnail_key: &str) -> Result<(), DomainError> {
        if self.status != UploadStatus::Completed {
            return Err(DomainError::ThumbnailNotAllowed(self.status));
        }
        if thumbnail_key.is_empty() {
            return Err(DomainError::EmptyStorageKey);
        }
        self.thumbnail_key = Some(thumbnail_key.to_string());
        Ok(())
    }

    /// Deletion is an external concern; it is only blocked while the
    /// pipeline may hold a storage write in flight.
    pub fn can_delete(&self) -> bool {
        self.status != UploadStatus::Uploading
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Drains the buffered events. Infrastructure calls this exactly once
    /// after a successful save.
    pub fn take_events(&mut self) -> Vec<UploadEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[UploadEvent] {
        &self.events
    }

    fn transition(&mut self, next: UploadStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    fn raise(&mut self, event: UploadEvent) {
        self.events.push(event);
    }

    pub fn id(&self) -> PhotoId {
        self.id
    }

    pub fn filename(&self) -> &Filename {
        &self.filename
    }

    pub fn size(&self) -> FileSize {
        self.size
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn thumbnail_key(&self) -> Option<&str> {
        self.thumbnail_key.as_deref()
    }

    pub fn uploaded_by(&self) -> UserId {
        self.uploaded_by
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.uploaded_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued_photo() -> Photo {
        Photo::create(
            PhotoId::new(),
            Filename::new("sunset.jpg").unwrap(),
            FileSize::new(2048).unwrap(),
            ContentType::new("image/jpeg").unwrap(),
            UserId::new(),
            None,
        )
    }

    #[test]
    fn test_create_is_queued_and_raises_started() {
        let photo = queued_photo();
        assert_eq!(photo.status(), UploadStatus::Queued);
        assert_eq!(photo.storage_key(), None);
        assert_eq!(photo.retry_count(), 0);

        assert_eq!(photo.pending_events().len(), 1);
        assert!(matches!(
            photo.pending_events()[0],
            UploadEvent::PhotoUploadStarted(_)
        ));
    }

    #[test]
    fn test_mark_as_uploading_raises_zero_progress() {
        let mut photo = queued_photo();
        photo.take_events();

        photo.mark_as_uploading().unwrap();
        assert_eq!(photo.status(), UploadStatus::Uploading);
        assert!(matches!(
            photo.pending_events()[0],
            UploadEvent::PhotoUploadProgressed(PhotoUploadProgressed { percentage: 0, .. })
        ));
    }

    #[test]
    fn test_complete_from_queued_fails_without_side_effects() {
        let mut photo = queued_photo();
        photo.take_events();

        let err = photo.mark_as_completed("photos/x.jpg").unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: UploadStatus::Queued,
                to: UploadStatus::Completed,
            }
        );
        assert_eq!(photo.status(), UploadStatus::Queued);
        assert_eq!(photo.storage_key(), None);
        assert!(photo.pending_events().is_empty());
    }

    #[test]
    fn test_complete_requires_non_empty_key() {
        let mut photo = queued_photo();
        photo.mark_as_uploading().unwrap();
        assert_eq!(
            photo.mark_as_completed(""),
            Err(DomainError::EmptyStorageKey)
        );
        assert_eq!(photo.status(), UploadStatus::Uploading);
    }

    #[test]
    fn test_completed_photo_has_storage_key_and_timestamp() {
        let mut photo = queued_photo();
        photo.mark_as_uploading().unwrap();
        photo.mark_as_completed("photos/abc.jpg").unwrap();

        assert_eq!(photo.status(), UploadStatus::Completed);
        assert_eq!(photo.storage_key(), Some("photos/abc.jpg"));
        assert!(photo.uploaded_at().is_some());
    }

    #[test]
    fn test_update_progress_requires_uploading() {
        let mut photo = queued_photo();
        assert_eq!(
            photo.update_progress(50),
            Err(DomainError::ProgressNotAllowed(UploadStatus::Queued))
        );

        photo.mark_as_uploading().unwrap();
        photo.update_progress(50).unwrap();
        assert_eq!(
            photo.update_progress(101),
            Err(DomainError::ProgressOutOfRange(101))
        );
    }

    #[test]
    fn test_fail_from_queued_is_legal() {
        let mut photo = queued_photo();
        photo.mark_as_failed("rejected before staging").unwrap();
        assert_eq!(photo.status(), UploadStatus::Failed);
        assert_eq!(photo.last_error(), Some("rejected before staging"));
    }

    #[test]
    fn test_fail_from_completed_is_rejected() {
        let mut photo = queued_photo();
        photo.mark_as_uploading().unwrap();
        photo.mark_as_completed("photos/abc.jpg").unwrap();
        assert!(photo.mark_as_failed("late failure").is_err());
    }

    #[test]
    fn test_retry_round_trip_ends_completed() {
        let mut photo = queued_photo();
        photo.mark_as_uploading().unwrap();
        photo.mark_as_failed("network down").unwrap();
        photo.take_events();

        photo.reset_for_retry(3).unwrap();
        assert_eq!(photo.status(), UploadStatus::Queued);
        assert_eq!(photo.retry_count(), 1);
        assert!(matches!(
            photo.pending_events()[0],
            UploadEvent::PhotoUploadStarted(_)
        ));

        photo.mark_as_uploading().unwrap();
        photo.mark_as_completed("photos/abc.jpg").unwrap();
        assert_eq!(photo.status(), UploadStatus::Completed);
        assert_eq!(photo.storage_key(), Some("photos/abc.jpg"));
    }

    #[test]
    fn test_retry_limit_is_enforced() {
        let mut photo = queued_photo();
        photo.mark_as_uploading().unwrap();
        photo.mark_as_failed("one").unwrap();
        photo.reset_for_retry(1).unwrap();
        photo.mark_as_uploading().unwrap();
        photo.mark_as_failed("two").unwrap();

        assert_eq!(
            photo.reset_for_retry(1),
            Err(DomainError::RetryLimitReached { max_attempts: 1 })
        );
    }

    #[test]
    fn test_retry_requires_failed() {
        let mut photo = queued_photo();
        assert!(photo.reset_for_retry(3).is_err());
    }

    #[test]
    fn test_cancel_rules() {
        let mut photo = queued_photo();
        photo.cancel().unwrap();
        assert_eq!(photo.status(), UploadStatus::Cancelled);
        // Second cancel is a no-op.
        photo.cancel().unwrap();

        let mut done = queued_photo();
        done.mark_as_uploading().unwrap();
        done.mark_as_completed("photos/abc.jpg").unwrap();
        assert!(done.cancel().is_err());
    }

    #[test]
    fn test_can_delete_blocked_only_while_uploading() {
        let mut photo = queued_photo();
        assert!(photo.can_delete());
        photo.mark_as_uploading().unwrap();
        assert!(!photo.can_delete());
        photo.mark_as_completed("photos/abc.jpg").unwrap();
        assert!(photo.can_delete());
    }

    #[test]
    fn test_thumbnail_only_after_completion() {
        let mut photo = queued_photo();
        assert_eq!(
            photo.attach_thumbnail("thumbs/abc.jpg"),
            Err(DomainError::ThumbnailNotAllowed(UploadStatus::Queued))
        );

        photo.mark_as_uploading().unwrap();
        photo.mark_as_completed("photos/abc.jpg").unwrap();
        photo.attach_thumbnail("thumbs/abc.jpg").unwrap();
        assert_eq!(photo.thumbnail_key(), Some("thumbs/abc.jpg"));
    }

    #[test]
    fn test_take_events_drains_once() {
        let mut photo = queued_photo();
        assert_eq!(photo.take_events().len(), 1);
        assert!(photo.take_events().is_empty());
    }
}
