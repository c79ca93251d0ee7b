//! HTTP error response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fotodrop_core::{DomainError, RepositoryError};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling.
    pub code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("file exceeds maximum upload size of {max} bytes")]
    FileTooLarge { max: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::PhotoNotFound(id) => ApiError::NotFound(format!("photo {id}")),
            RepositoryError::JobNotFound(id) => ApiError::NotFound(format!("upload job {id}")),
            RepositoryError::Domain(err) => ApiError::Domain(err),
            RepositoryError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(DomainError::NotOwner(_)) => StatusCode::FORBIDDEN,
            ApiError::Domain(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            // Invalid transitions and aggregate conflicts are ordering
            // faults, not malformed input.
            ApiError::Domain(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(DomainError::NotOwner(_)) => "FORBIDDEN",
            ApiError::Domain(err) if err.is_validation() => "INVALID_INPUT",
            ApiError::Domain(_) => "CONFLICT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "INVALID_INPUT",
            ApiError::FileTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fotodrop_core::{JobStatus, UserId};

    #[test]
    fn test_validation_errors_are_bad_request() {
        let err = ApiError::from(DomainError::EmptyFilename);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_transition_errors_are_conflicts() {
        let err = ApiError::from(DomainError::JobFinalized(JobStatus::Completed));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_ownership_errors_are_forbidden() {
        let err = ApiError::from(DomainError::NotOwner(UserId::new()));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = ApiError::from(RepositoryError::JobNotFound(fotodrop_core::JobId::new()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
