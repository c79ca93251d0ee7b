//! Upload job endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use fotodrop_core::{JobId, UploadJob, UserId};

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJobRequest {
    pub user_id: Uuid,
    /// Number of photos this batch will contain (1-100).
    pub total_photos: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobCreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_photos: u32,
    pub completed_photos: u32,
    pub failed_photos: u32,
    pub status: String,
    /// Share of photos completed, 0-100.
    pub progress: u8,
    pub photo_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<UploadJob> for JobResponse {
    fn from(job: UploadJob) -> Self {
        JobResponse {
            id: job.id().as_uuid(),
            user_id: job.user_id().as_uuid(),
            total_photos: job.total_photos(),
            completed_photos: job.completed_photos(),
            failed_photos: job.failed_photos(),
            status: job.status().to_string(),
            progress: job.overall_progress(),
            photo_ids: job.photo_ids().iter().map(|id| id.as_uuid()).collect(),
            created_at: job.created_at(),
            completed_at: job.completed_at(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v0/jobs",
    tag = "jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 200, description = "Upload job created", body = JobCreatedResponse),
        (status = 400, description = "Invalid photo count", body = ErrorResponse)
    )
)]
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<JobCreatedResponse>, ApiError> {
    let job_id = state
        .uploads
        .create_job(UserId::from_uuid(request.user_id), request.total_photos)
        .await?;
    Ok(Json(JobCreatedResponse {
        id: job_id.as_uuid(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/jobs/{id}",
    tag = "jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job state", body = JobResponse),
        (status = 404, description = "Unknown job", body = ErrorResponse)
    )
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state.uploads.job(JobId::from_uuid(id)).await?;
    Ok(Json(job.into()))
}
