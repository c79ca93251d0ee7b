//! OpenAPI documentation.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health,
        crate::handlers::jobs::create_job,
        crate::handlers::jobs::get_job,
        crate::handlers::photos::upload_photo,
        crate::handlers::photos::get_photo,
        crate::handlers::photos::retry_photo,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::health::HealthResponse,
        crate::handlers::jobs::CreateJobRequest,
        crate::handlers::jobs::JobCreatedResponse,
        crate::handlers::jobs::JobResponse,
        crate::handlers::photos::UploadAcceptedResponse,
        crate::handlers::photos::PhotoResponse,
    )),
    tags(
        (name = "jobs", description = "Batch upload jobs"),
        (name = "photos", description = "Photo uploads"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
