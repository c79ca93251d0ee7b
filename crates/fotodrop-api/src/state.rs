use std::sync::Arc;

use fotodrop_core::{Config, PhotoRepository, UploadJobRepository};
use fotodrop_infra::{EventBus, ProgressBroadcaster};
use fotodrop_worker::UploadWorkerPool;

use crate::services::UploadService;

/// Shared application state.
///
/// Every component is constructed once at startup and injected; the pool
/// handle is kept here so the workers live as long as the server.
pub struct AppState {
    pub config: Config,
    pub uploads: UploadService,
    pub photos: Arc<dyn PhotoRepository>,
    pub jobs: Arc<dyn UploadJobRepository>,
    pub broadcaster: Arc<ProgressBroadcaster>,
    pub bus: EventBus,
    pub pool: UploadWorkerPool,
}
