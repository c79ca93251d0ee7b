//! Bounded worker pool for the upload pipeline.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Semaphore};

use fotodrop_core::{PhotoId, UploadEvent};

use crate::processor::{UploadProcessor, QUEUE_FULL_MESSAGE};

#[derive(Debug, Clone)]
pub struct UploadPoolConfig {
    pub max_workers: usize,
    /// Bounded work queue; when full, new photos are rejected rather than
    /// queued without limit.
    pub queue_capacity: usize,
}

impl Default for UploadPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            queue_capacity: 100,
        }
    }
}

/// Consumes `PhotoUploadStarted` events and runs the pipeline on a
/// bounded set of workers. Each accepted photo is processed end-to-end by
/// a single task; photos run in parallel up to `max_workers` with no
/// cross-photo ordering.
pub struct UploadWorkerPool {
    shutdown_tx: mpsc::Sender<()>,
}

impl UploadWorkerPool {
    pub fn start(
        config: UploadPoolConfig,
        processor: Arc<UploadProcessor>,
        events: broadcast::Receiver<UploadEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (work_tx, work_rx) = mpsc::channel::<PhotoId>(config.queue_capacity);

        tracing::info!(
            max_workers = config.max_workers,
            queue_capacity = config.queue_capacity,
            "upload worker pool started"
        );

        tokio::spawn(Self::intake_loop(
            events,
            work_tx,
            processor.clone(),
            shutdown_rx,
        ));
        tokio::spawn(Self::dispatch_loop(
            work_rx,
            processor,
            config.max_workers,
        ));

        Self { shutdown_tx }
    }

    pub async fn shutdown(&self) {
        tracing::info!("upload worker pool shutting down");
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn intake_loop(
        mut events: broadcast::Receiver<UploadEvent>,
        work_tx: mpsc::Sender<PhotoId>,
        processor: Arc<UploadProcessor>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = events.recv() => match event {
                    Ok(UploadEvent::PhotoUploadStarted(started)) => {
                        if let Err(mpsc::error::TrySendError::Full(photo_id)) =
                            work_tx.try_send(started.photo_id)
                        {
                            processor.reject(photo_id, QUEUE_FULL_MESSAGE).await;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "worker pool lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        // Dropping work_tx lets the dispatch loop drain and stop.
        tracing::info!("upload worker pool intake stopped");
    }

    async fn dispatch_loop(
        mut work_rx: mpsc::Receiver<PhotoId>,
        processor: Arc<UploadProcessor>,
        max_workers: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(max_workers));
        while let Some(photo_id) = work_rx.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let processor = processor.clone();
            tokio::spawn(async move {
                let _permit = permit;
                processor.process(photo_id).await;
            });
        }
        tracing::info!("upload worker pool stopped");
    }
}
