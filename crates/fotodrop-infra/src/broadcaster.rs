//! Live progress broadcaster.
//!
//! Maps each user to a single outbound channel and forwards progress
//! frames derived from upload events. Delivery is best-effort and
//! fire-and-forget: no acknowledgement, no buffering for disconnected
//! clients, no cross-photo ordering.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use uuid::Uuid;

use fotodrop_core::{
    JobId, PhotoId, PhotoRepository, UploadEvent, UploadJob, UploadJobRepository, UserId,
};

/// Outbound frame buffer per connection.
pub const CONNECTION_BUFFER: usize = 64;

/// Distinguishes a registration so a stale disconnect cannot evict a
/// newer connection for the same user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionId(Uuid);

/// One progress update on the live feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_id: Option<PhotoId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub current: u32,
    pub total: u32,
    pub status: String,
}

impl ProgressFrame {
    fn photo(photo_id: PhotoId, current: u32, status: String) -> Self {
        Self {
            frame_type: "photo_progress",
            photo_id: Some(photo_id),
            job_id: None,
            current,
            total: 100,
            status,
        }
    }

    fn job(job: &UploadJob) -> Self {
        Self {
            frame_type: "job_progress",
            photo_id: None,
            job_id: Some(job.id()),
            current: job.completed_photos() + job.failed_photos(),
            total: job.total_photos(),
            status: job.status().to_string(),
        }
    }
}

struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<ProgressFrame>,
}

/// Forwards per-user progress frames to live connections.
pub struct ProgressBroadcaster {
    connections: Mutex<HashMap<UserId, Connection>>,
    photos: Arc<dyn PhotoRepository>,
    jobs: Arc<dyn UploadJobRepository>,
}

impl ProgressBroadcaster {
    pub fn new(photos: Arc<dyn PhotoRepository>, jobs: Arc<dyn UploadJobRepository>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            photos,
            jobs,
        }
    }

    /// Registers the user's live channel. A new registration supersedes
    /// any existing one for the same user: the old sender is dropped,
    /// which closes the superseded connection's forwarding loop.
    pub fn register(&self, user_id: UserId, tx: mpsc::Sender<ProgressFrame>) -> ConnectionId {
        let id = ConnectionId(Uuid::new_v4());
        let replaced = self
            .connections
            .lock()
            .unwrap()
            .insert(user_id, Connection { id, tx });
        if replaced.is_some() {
            tracing::debug!(user_id = %user_id, "superseded existing progress connection");
        }
        id
    }

    /// Removes the registration, but only if `connection_id` still names
    /// the live one; a disconnect of a superseded connection is a no-op.
    pub fn unregister(&self, user_id: UserId, connection_id: ConnectionId) {
        let mut connections = self.connections.lock().unwrap();
        if connections
            .get(&user_id)
            .is_some_and(|conn| conn.id == connection_id)
        {
            connections.remove(&user_id);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Consumes bus events until the bus closes.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<UploadEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.dispatch(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "progress broadcaster lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn dispatch(&self, event: UploadEvent) {
        match event {
            UploadEvent::PhotoUploadProgressed(e) => {
                self.forward_photo_frame(e.photo_id, u32::from(e.percentage))
                    .await;
            }
            UploadEvent::PhotoUploadCompleted(e) => {
                self.forward_photo_frame(e.photo_id, 100).await;
            }
            UploadEvent::PhotoUploadFailed(e) => {
                self.forward_photo_frame(e.photo_id, 0).await;
            }
            UploadEvent::UploadJobProgressed(e) => self.forward_job_frame(e.job_id).await,
            UploadEvent::UploadJobCompleted(e) => self.forward_job_frame(e.job_id).await,
            UploadEvent::UploadJobFailed(e) => self.forward_job_frame(e.job_id).await,
            // Creation events carry no progress to render.
            UploadEvent::PhotoUploadStarted(_) | UploadEvent::UploadJobCreated(_) => {}
        }
    }

    async fn forward_photo_frame(&self, photo_id: PhotoId, current: u32) {
        let photo = match self.photos.find(photo_id).await {
            Ok(Some(photo)) => photo,
            Ok(None) => {
                tracing::debug!(photo_id = %photo_id, "dropping frame for unknown photo");
                return;
            }
            Err(err) => {
                tracing::warn!(photo_id = %photo_id, error = %err, "failed to resolve photo owner");
                return;
            }
        };
        let frame = ProgressFrame::photo(photo_id, current, photo.status().to_string());
        self.send_to(photo.uploaded_by(), frame);
    }

    async fn forward_job_frame(&self, job_id: JobId) {
        let job = match self.jobs.find(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::debug!(job_id = %job_id, "dropping frame for unknown job");
                return;
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "failed to resolve job owner");
                return;
            }
        };
        self.send_to(job.user_id(), ProgressFrame::job(&job));
    }

    fn send_to(&self, user_id: UserId, frame: ProgressFrame) {
        let mut connections = self.connections.lock().unwrap();
        let Some(conn) = connections.get(&user_id) else {
            return;
        };
        match conn.tx.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(user_id = %user_id, "dropping closed progress connection");
                connections.remove(&user_id);
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Slow consumer; frames are droppable by contract.
                tracing::debug!(user_id = %user_id, "progress connection full, frame dropped");
            }
        }
    }
}
