//! Fotodrop core – domain model for the batch photo upload backend.
//!
//! This crate holds the pure domain: typed identifiers, validated scalars,
//! the `Photo` upload state machine, the `UploadJob` batch aggregate, the
//! domain events they raise, and the repository contracts the rest of the
//! system depends on. Nothing in here performs I/O.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod job;
pub mod photo;
pub mod repository;
pub mod values;

pub use config::Config;
pub use error::DomainError;
pub use events::UploadEvent;
pub use ids::{JobId, PhotoId, UserId};
pub use job::{JobStatus, UploadJob, MAX_PHOTOS_PER_JOB, MIN_PHOTOS_PER_JOB};
pub use photo::{Photo, UploadStatus};
pub use repository::{
    JobMutation, PhotoRepository, RepositoryError, RepositoryResult, UploadJobRepository,
};
pub use values::{ContentType, FileSize, Filename};
