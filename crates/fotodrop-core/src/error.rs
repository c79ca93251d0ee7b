//! Domain error types.

use crate::ids::{PhotoId, UserId};
use crate::job::JobStatus;
use crate::photo::UploadStatus;
use crate::values::MAX_FILENAME_LENGTH;

/// Errors raised by the upload domain.
///
/// Validation variants are rejected at construction and never reach a
/// stored state; transition variants signal a state-machine method invoked
/// from a status that does not permit it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("filename must not be empty")]
    EmptyFilename,

    #[error("filename exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,

    #[error("file size must be greater than zero")]
    ZeroFileSize,

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("invalid upload transition from {from} to {to}")]
    InvalidTransition {
        from: UploadStatus,
        to: UploadStatus,
    },

    #[error("progress percentage {0} is out of range (0-100)")]
    ProgressOutOfRange(u8),

    #[error("progress can only be updated while uploading (current status: {0})")]
    ProgressNotAllowed(UploadStatus),

    #[error("storage key must not be empty")]
    EmptyStorageKey,

    #[error("retry limit of {max_attempts} attempts reached")]
    RetryLimitReached { max_attempts: u32 },

    #[error("thumbnail can only be attached to a completed photo (current status: {0})")]
    ThumbnailNotAllowed(UploadStatus),

    #[error("total photos must be between {min} and {max}, got {got}")]
    InvalidTotalPhotos { min: u32, max: u32, got: u32 },

    #[error("photo {0} is already part of this job")]
    DuplicatePhoto(PhotoId),

    #[error("job already holds its declared total of {0} photos")]
    JobFull(u32),

    #[error("photo {0} is not a member of this job")]
    UnknownPhoto(PhotoId),

    #[error("invalid job transition from {from} to {to}")]
    InvalidJobTransition { from: JobStatus, to: JobStatus },

    #[error("job is already finalized as {0}")]
    JobFinalized(JobStatus),

    #[error("not owned by user {0}")]
    NotOwner(UserId),
}

impl DomainError {
    /// Whether this error is a malformed-input rejection, as opposed to a
    /// state-machine ordering fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyFilename
                | DomainError::FilenameTooLong
                | DomainError::ZeroFileSize
                | DomainError::UnsupportedContentType(_)
                | DomainError::ProgressOutOfRange(_)
                | DomainError::EmptyStorageKey
                | DomainError::InvalidTotalPhotos { .. }
        )
    }
}
