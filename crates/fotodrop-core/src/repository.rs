//! Repository contracts for the upload aggregates.
//!
//! Persistence is an external collaborator; this subsystem only depends on
//! the contracts below. Implementations are responsible for serializing
//! concurrent saves to the same aggregate id, which is what preserves the
//! monotonicity of the job counters.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::events::UploadEvent;
use crate::ids::{JobId, PhotoId};
use crate::job::UploadJob;
use crate::photo::Photo;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("photo not found: {0}")]
    PhotoNotFound(PhotoId),

    #[error("upload job not found: {0}")]
    JobNotFound(JobId),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("repository backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A mutation applied to an upload job under the repository's per-id
/// serialization guarantee.
pub type JobMutation = Box<dyn FnOnce(&mut UploadJob) -> Result<(), DomainError> + Send>;

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Persists the photo's current state. Buffered events are not part of
    /// the stored state; the caller drains and publishes them after the
    /// save succeeds.
    async fn save(&self, photo: &Photo) -> RepositoryResult<()>;

    async fn find(&self, id: PhotoId) -> RepositoryResult<Option<Photo>>;
}

#[async_trait]
pub trait UploadJobRepository: Send + Sync {
    async fn save(&self, job: &UploadJob) -> RepositoryResult<()>;

    async fn find(&self, id: JobId) -> RepositoryResult<Option<UploadJob>>;

    /// Atomically loads, mutates, and stores the job. The implementation
    /// serializes concurrent updates to the same id. On success the
    /// aggregate's buffered events are drained exactly once and returned
    /// with the stored snapshot; on a mutation error nothing is stored.
    async fn update(
        &self,
        id: JobId,
        mutate: JobMutation,
    ) -> RepositoryResult<(UploadJob, Vec<UploadEvent>)>;
}
