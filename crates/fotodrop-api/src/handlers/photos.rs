//! Photo upload endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use fotodrop_core::{JobId, Photo, PhotoId, UserId};

use crate::error::{ApiError, ErrorResponse};
use crate::services::UploadPhotoCommand;
use crate::state::AppState;

use super::UserQuery;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadAcceptedResponse {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub file_size: u64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,
    pub uploaded_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl From<Photo> for PhotoResponse {
    fn from(photo: Photo) -> Self {
        PhotoResponse {
            id: photo.id().as_uuid(),
            filename: photo.filename().as_str().to_string(),
            content_type: photo.content_type().as_str().to_string(),
            file_size: photo.size().bytes(),
            status: photo.status().to_string(),
            storage_key: photo.storage_key().map(String::from),
            thumbnail_key: photo.thumbnail_key().map(String::from),
            uploaded_by: photo.uploaded_by().as_uuid(),
            job_id: photo.job_id().map(|id| id.as_uuid()),
            retry_count: photo.retry_count(),
            last_error: photo.last_error().map(String::from),
            created_at: photo.created_at(),
            uploaded_at: photo.uploaded_at(),
        }
    }
}

/// The `file` part of a multipart upload.
struct FilePart {
    filename: String,
    content_type: String,
    data: Bytes,
}

async fn read_multipart(
    multipart: &mut Multipart,
) -> Result<(Option<FilePart>, Option<JobId>), ApiError> {
    let mut file = None;
    let mut job_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("file part has no filename".into()))?;
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("file part has no content type".into()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("could not read file part: {e}")))?;
                file = Some(FilePart {
                    filename,
                    content_type,
                    data,
                });
            }
            Some("job_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("could not read job_id: {e}")))?;
                let parsed: Uuid = raw
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("invalid job_id: {raw}")))?;
                job_id = Some(JobId::from_uuid(parsed));
            }
            _ => {}
        }
    }
    Ok((file, job_id))
}

#[utoipa::path(
    post,
    path = "/api/v0/photos",
    tag = "photos",
    params(UserQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo accepted and queued", body = UploadAcceptedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Job cannot accept this photo", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadAcceptedResponse>, ApiError> {
    let (file, job_id) = read_multipart(&mut multipart).await?;
    let file = file.ok_or_else(|| ApiError::BadRequest("multipart field 'file' is required".into()))?;

    let photo_id = state
        .uploads
        .upload_photo(UploadPhotoCommand {
            user_id: UserId::from_uuid(query.user_id),
            filename: file.filename,
            content_type: file.content_type,
            data: file.data,
            job_id,
        })
        .await?;

    Ok(Json(UploadAcceptedResponse {
        id: photo_id.as_uuid(),
        status: "queued".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/photos/{id}",
    tag = "photos",
    params(("id" = Uuid, Path, description = "Photo id")),
    responses(
        (status = 200, description = "Photo state", body = PhotoResponse),
        (status = 404, description = "Unknown photo", body = ErrorResponse)
    )
)]
pub async fn get_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let photo = state.uploads.photo(PhotoId::from_uuid(id)).await?;
    Ok(Json(photo.into()))
}

#[utoipa::path(
    post,
    path = "/api/v0/photos/{id}/retry",
    tag = "photos",
    params(("id" = Uuid, Path, description = "Photo id"), UserQuery),
    responses(
        (status = 200, description = "Retry queued", body = PhotoResponse),
        (status = 403, description = "Not the photo owner", body = ErrorResponse),
        (status = 404, description = "Unknown photo", body = ErrorResponse),
        (status = 409, description = "Photo is not retryable", body = ErrorResponse)
    )
)]
pub async fn retry_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let photo_id = PhotoId::from_uuid(id);
    let user_id = UserId::from_uuid(query.user_id);
    state
        .uploads
        .retry_failed_upload(photo_id, user_id, None)
        .await?;
    let photo = state.uploads.photo(photo_id).await?;
    Ok(Json(photo.into()))
}
