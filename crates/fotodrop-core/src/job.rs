//! The `UploadJob` aggregate: tracks a batch of photo uploads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::events::{
    UploadEvent, UploadJobCompleted, UploadJobCreated, UploadJobFailed, UploadJobProgressed,
};
use crate::ids::{JobId, PhotoId, UserId};

pub const MIN_PHOTOS_PER_JOB: u32 = 1;
pub const MAX_PHOTOS_PER_JOB: u32 = 100;

/// Aggregate status of a batch upload job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    InProgress,
    Completed,
    PartiallyFailed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::PartiallyFailed | JobStatus::Failed
        )
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Created, InProgress)
                | (InProgress, Completed)
                | (InProgress, PartiallyFailed)
                | (InProgress, Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Created => "created",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::PartiallyFailed => "partially_failed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A tracked batch of photo uploads.
///
/// Counters are monotone and never exceed `total_photos`; once
/// `completed + failed == total` the job is finalized exactly once.
#[derive(Debug, Clone)]
pub struct UploadJob {
    id: JobId,
    user_id: UserId,
    photo_ids: Vec<PhotoId>,
    total_photos: u32,
    completed_photos: u32,
    failed_photos: u32,
    status: JobStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    events: Vec<UploadEvent>,
}

impl UploadJob {
    /// Creates a job expecting `total_photos` uploads (1 to 100) and raises
    /// `UploadJobCreated`.
    pub fn create(id: JobId, user_id: UserId, total_photos: u32) -> Result<Self, DomainError> {
        if !(MIN_PHOTOS_PER_JOB..=MAX_PHOTOS_PER_JOB).contains(&total_photos) {
            return Err(DomainError::InvalidTotalPhotos {
                min: MIN_PHOTOS_PER_JOB,
                max: MAX_PHOTOS_PER_JOB,
                got: total_photos,
            });
        }
        let mut job = Self {
            id,
            user_id,
            photo_ids: Vec::with_capacity(total_photos as usize),
            total_photos,
            completed_photos: 0,
            failed_photos: 0,
            status: JobStatus::Created,
            created_at: Utc::now(),
            completed_at: None,
            events: Vec::new(),
        };
        job.raise(
            UploadJobCreated {
                job_id: id,
                user_id,
                total_photos,
                occurred_at: Utc::now(),
            }
            .into(),
        );
        Ok(job)
    }

    /// Registers a member photo. Rejects duplicates and additions past the
    /// declared total; the first addition moves the job in progress.
    pub fn add_photo(&mut self, photo_id: PhotoId) -> Result<(), DomainError> {
        if self.photo_ids.contains(&photo_id) {
            return Err(DomainError::DuplicatePhoto(photo_id));
        }
        if self.photo_ids.len() as u32 == self.total_photos {
            return Err(DomainError::JobFull(self.total_photos));
        }
        if self.status == JobStatus::Created {
            self.transition(JobStatus::InProgress)?;
        }
        self.photo_ids.push(photo_id);
        Ok(())
    }

    /// Records the durable completion of a member photo.
    pub fn mark_photo_completed(&mut self, photo_id: PhotoId) -> Result<(), DomainError> {
        self.record_outcome(photo_id, true)
    }

    /// Records the terminal failure of a member photo.
    pub fn mark_photo_failed(&mut self, photo_id: PhotoId) -> Result<(), DomainError> {
        self.record_outcome(photo_id, false)
    }

    fn record_outcome(&mut self, photo_id: PhotoId, completed: bool) -> Result<(), DomainError> {
        if !self.photo_ids.contains(&photo_id) {
            return Err(DomainError::UnknownPhoto(photo_id));
        }
        if self.status.is_terminal() {
            return Err(DomainError::JobFinalized(self.status));
        }
        if completed {
            self.completed_photos += 1;
        } else {
            self.failed_photos += 1;
        }
        self.raise(
            UploadJobProgressed {
                job_id: self.id,
                completed: self.completed_photos,
                failed: self.failed_photos,
                total: self.total_photos,
                percentage: self.processed_percentage(),
                occurred_at: Utc::now(),
            }
            .into(),
        );
        self.evaluate_completion();
        Ok(())
    }

    /// Finalizes the job once every member photo has reported. A no-op
    /// while photos are still in flight or once the job is already
    /// terminal, so the terminal event is emitted exactly once.
    fn evaluate_completion(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        if self.completed_photos + self.failed_photos < self.total_photos {
            return;
        }

        let outcome = if self.failed_photos == 0 {
            JobStatus::Completed
        } else if self.completed_photos == 0 {
            JobStatus::Failed
        } else {
            JobStatus::PartiallyFailed
        };
        // The transition table admits every terminal status from InProgress;
        // outcomes are only recorded for member photos, which implies the
        // job left Created on the first addition.
        if self.transition(outcome).is_err() {
            return;
        }
        self.completed_at = Some(Utc::now());

        let event = match outcome {
            JobStatus::Completed => UploadJobCompleted {
                job_id: self.id,
                total_photos: self.total_photos,
                occurred_at: Utc::now(),
            }
            .into(),
            JobStatus::Failed => UploadJobFailed {
                job_id: self.id,
                error_message: format!("all {} photos failed", self.total_photos),
                occurred_at: Utc::now(),
            }
            .into(),
            _ => UploadJobFailed {
                job_id: self.id,
                error_message: format!(
                    "{} of {} photos failed",
                    self.failed_photos, self.total_photos
                ),
                occurred_at: Utc::now(),
            }
            .into(),
        };
        self.raise(event);
    }

    /// Share of photos that completed, 0..=100. Defined before any photo
    /// finishes (returns 0).
    pub fn overall_progress(&self) -> u8 {
        Self::percentage(self.completed_photos, self.total_photos)
    }

    /// Share of photos that finished either way, 0..=100.
    pub fn processed_percentage(&self) -> u8 {
        Self::percentage(self.completed_photos + self.failed_photos, self.total_photos)
    }

    fn percentage(part: u32, total: u32) -> u8 {
        ((part as f64 / total as f64) * 100.0).round() as u8
    }

    /// Drains the buffered events. Infrastructure calls this exactly once
    /// after a successful save.
    pub fn take_events(&mut self) -> Vec<UploadEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[UploadEvent] {
        &self.events
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidJobTransition {
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

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn photo_ids(&self) -> &[PhotoId] {
        &self.photo_ids
    }

    pub fn total_photos(&self) -> u32 {
        self.total_photos
    }

    pub fn completed_photos(&self) -> u32 {
        self.completed_photos
    }

    pub fn failed_photos(&self) -> u32 {
        self.failed_photos
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
