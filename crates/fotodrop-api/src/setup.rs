//! Application wiring: storage backend, event bus, worker pool,
//! broadcaster, routes.

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use fotodrop_core::config::StorageConfig;
use fotodrop_core::{Config, PhotoRepository, UploadJobRepository};
use fotodrop_infra::{
    EventBus, InMemoryPhotoRepository, InMemoryUploadJobRepository, ProgressBroadcaster,
    StagingArea,
};
use fotodrop_storage::{MemoryStorage, ObjectStorage, S3Storage};
use fotodrop_worker::{UploadPoolConfig, UploadProcessor, UploadWorkerPool};

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::services::UploadService;
use crate::state::AppState;

/// Builds every component and the router. Repositories, staging, and the
/// bus are constructed here and injected; tests build their own isolated
/// instances the same way.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let photos: Arc<dyn PhotoRepository> = Arc::new(InMemoryPhotoRepository::new());
    let jobs: Arc<dyn UploadJobRepository> = Arc::new(InMemoryUploadJobRepository::new());
    let staging = StagingArea::new();
    let bus = EventBus::default();
    let storage = build_storage(&config.storage).await?;

    let broadcaster = Arc::new(ProgressBroadcaster::new(photos.clone(), jobs.clone()));
    tokio::spawn(broadcaster.clone().run(bus.subscribe()));

    let processor = Arc::new(UploadProcessor::new(
        photos.clone(),
        jobs.clone(),
        staging.clone(),
        storage,
        bus.clone(),
        Duration::from_secs(config.upload.upload_timeout_seconds),
    ));
    let pool = UploadWorkerPool::start(
        UploadPoolConfig {
            max_workers: config.worker.max_workers,
            queue_capacity: config.worker.queue_capacity,
        },
        processor,
        bus.subscribe(),
    );

    let uploads = UploadService::new(
        photos.clone(),
        jobs.clone(),
        staging,
        bus.clone(),
        config.upload.clone(),
    );

    let state = Arc::new(AppState {
        config,
        uploads,
        photos,
        jobs,
        broadcaster,
        bus,
        pool,
    });
    let router = build_router(state.clone());
    Ok((state, router))
}

async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>> {
    match config.backend.as_str() {
        "s3" => {
            let bucket = config
                .bucket
                .clone()
                .context("S3_BUCKET is required for the s3 storage backend")?;
            let storage = S3Storage::new(
                bucket,
                config.region.clone(),
                config.endpoint_url.clone(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("failed to initialize S3 storage: {e}"))?;
            Ok(Arc::new(storage))
        }
        "memory" => {
            tracing::warn!("using in-memory storage backend; objects do not survive restarts");
            Ok(Arc::new(MemoryStorage::new()))
        }
        other => anyhow::bail!("unknown storage backend: {other}"),
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.upload.max_file_size + 64 * 1024;

    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api-doc/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/api/v0/jobs", post(handlers::jobs::create_job))
        .route("/api/v0/jobs/{id}", get(handlers::jobs::get_job))
        .route("/api/v0/photos", post(handlers::photos::upload_photo))
        .route("/api/v0/photos/{id}", get(handlers::photos::get_photo))
        .route(
            "/api/v0/photos/{id}/retry",
            post(handlers::photos::retry_photo),
        )
        .route("/api/v0/progress/ws", get(handlers::progress::progress_ws))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, router: Router) -> Result<()> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    tracing::info!(%addr, "fotodrop api listening");
    axum::serve(listener, router).await.context("server error")
}
