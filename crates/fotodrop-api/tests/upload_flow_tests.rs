//! Command-surface tests: create job, upload photo, retry, end to end.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use fotodrop_api::services::{UploadPhotoCommand, UploadService};
use fotodrop_api::setup::initialize_app;
use fotodrop_core::config::{
    Config, ServerConfig, StorageConfig, UploadPolicy, WorkerConfig,
};
use fotodrop_core::{
    JobStatus, PhotoId, PhotoRepository, UploadEvent, UploadJobRepository, UploadStatus, UserId,
};
use fotodrop_infra::{
    EventBus, InMemoryPhotoRepository, InMemoryUploadJobRepository, StagingArea,
    CONNECTION_BUFFER,
};
use fotodrop_storage::{MemoryStorage, ObjectStorage};
use fotodrop_worker::UploadProcessor;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    photos: Arc<InMemoryPhotoRepository>,
    jobs: Arc<InMemoryUploadJobRepository>,
    staging: StagingArea,
    bus: EventBus,
    storage: Arc<MemoryStorage>,
    service: UploadService,
    processor: Arc<UploadProcessor>,
}

fn harness() -> Harness {
    harness_with_policy(UploadPolicy::default())
}

fn harness_with_policy(policy: UploadPolicy) -> Harness {
    let photos = Arc::new(InMemoryPhotoRepository::new());
    let jobs = Arc::new(InMemoryUploadJobRepository::new());
    let staging = StagingArea::new();
    let bus = EventBus::default();
    let storage = Arc::new(MemoryStorage::new());
    let service = UploadService::new(
        photos.clone(),
        jobs.clone(),
        staging.clone(),
        bus.clone(),
        policy,
    );
    let processor = Arc::new(UploadProcessor::new(
        photos.clone(),
        jobs.clone(),
        staging.clone(),
        storage.clone() as Arc<dyn ObjectStorage>,
        bus.clone(),
        UPLOAD_TIMEOUT,
    ));
    Harness {
        photos,
        jobs,
        staging,
        bus,
        storage,
        service,
        processor,
    }
}

fn photo_command(user_id: UserId, job_id: Option<fotodrop_core::JobId>) -> UploadPhotoCommand {
    UploadPhotoCommand {
        user_id,
        filename: "beach.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        data: Bytes::from_static(b"jpeg bytes"),
        job_id,
    }
}

#[tokio::test]
async fn test_create_job_persists_and_publishes() {
    let h = harness();
    let mut events = h.bus.subscribe();
    let user_id = UserId::new();

    let job_id = h.service.create_job(user_id, 5).await.unwrap();

    let job = h.jobs.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::Created);
    assert_eq!(job.total_photos(), 5);
    assert!(matches!(
        events.try_recv().unwrap(),
        UploadEvent::UploadJobCreated(_)
    ));
}

#[tokio::test]
async fn test_create_job_rejects_invalid_total() {
    let h = harness();
    assert!(h.service.create_job(UserId::new(), 0).await.is_err());
    assert!(h.service.create_job(UserId::new(), 101).await.is_err());
}

#[tokio::test]
async fn test_upload_photo_queues_and_stages() {
    let h = harness();
    let mut events = h.bus.subscribe();
    let user_id = UserId::new();

    let photo_id = h
        .service
        .upload_photo(photo_command(user_id, None))
        .await
        .unwrap();

    // Caller sees QUEUED immediately; bytes are staged for the pipeline.
    let photo = h.photos.find(photo_id).await.unwrap().unwrap();
    assert_eq!(photo.status(), UploadStatus::Queued);
    assert!(h.staging.exists(photo_id));
    assert!(matches!(
        events.try_recv().unwrap(),
        UploadEvent::PhotoUploadStarted(_)
    ));
}

#[tokio::test]
async fn test_upload_photo_validates_scalars() {
    let h = harness();
    let user_id = UserId::new();

    let mut bad_name = photo_command(user_id, None);
    bad_name.filename = String::new();
    assert!(h.service.upload_photo(bad_name).await.is_err());

    let mut bad_type = photo_command(user_id, None);
    bad_type.content_type = "application/zip".to_string();
    assert!(h.service.upload_photo(bad_type).await.is_err());

    // Nothing was staged or persisted by the rejected commands.
    assert!(h.staging.is_empty());
    assert_eq!(h.photos.photo_count(), 0);
}

#[tokio::test]
async fn test_upload_photo_enforces_size_limit() {
    let h = harness_with_policy(UploadPolicy {
        max_file_size: 8,
        ..UploadPolicy::default()
    });
    let mut cmd = photo_command(UserId::new(), None);
    cmd.data = Bytes::from(vec![0u8; 9]);
    assert!(h.service.upload_photo(cmd).await.is_err());
}

#[tokio::test]
async fn test_upload_photo_rejects_overfull_job() {
    let h = harness();
    let user_id = UserId::new();
    let job_id = h.service.create_job(user_id, 1).await.unwrap();

    h.service
        .upload_photo(photo_command(user_id, Some(job_id)))
        .await
        .unwrap();
    let err = h
        .service
        .upload_photo(photo_command(user_id, Some(job_id)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("declared total"));

    // The rejected photo never reached the repository or staging.
    assert_eq!(h.photos.photo_count(), 1);
    assert_eq!(h.staging.len(), 1);
}

#[tokio::test]
async fn test_upload_photo_rejects_foreign_job() {
    let h = harness();
    let owner = UserId::new();
    let job_id = h.service.create_job(owner, 2).await.unwrap();

    let err = h
        .service
        .upload_photo(photo_command(UserId::new(), Some(job_id)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not owned"));
}

#[tokio::test]
async fn test_retry_rejects_non_failed_photo() {
    let h = harness();
    let user_id = UserId::new();
    let photo_id = h
        .service
        .upload_photo(photo_command(user_id, None))
        .await
        .unwrap();

    // Still queued; a retry makes no sense yet.
    assert!(h
        .service
        .retry_failed_upload(photo_id, user_id, None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_retry_checks_ownership() {
    let h = harness();
    let owner = UserId::new();
    let photo_id = h
        .service
        .upload_photo(photo_command(owner, None))
        .await
        .unwrap();

    let err = h
        .service
        .retry_failed_upload(photo_id, UserId::new(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not owned"));
}

#[tokio::test]
async fn test_retry_unknown_photo_is_not_found() {
    let h = harness();
    assert!(h
        .service
        .retry_failed_upload(PhotoId::new(), UserId::new(), None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_failed_upload_retries_to_completion() {
    let h = harness();
    let user_id = UserId::new();
    let photo_id = h
        .service
        .upload_photo(photo_command(user_id, None))
        .await
        .unwrap();

    // Simulate a pipeline failure that already consumed the staged bytes.
    h.staging.remove(photo_id);
    h.processor.process(photo_id).await;
    let photo = h.photos.find(photo_id).await.unwrap().unwrap();
    assert_eq!(photo.status(), UploadStatus::Failed);

    // Explicit retry with re-staged bytes runs the pipeline again.
    h.service
        .retry_failed_upload(photo_id, user_id, Some(Bytes::from_static(b"jpeg bytes")))
        .await
        .unwrap();
    h.processor.process(photo_id).await;

    let photo = h.photos.find(photo_id).await.unwrap().unwrap();
    assert_eq!(photo.status(), UploadStatus::Completed);
    assert_eq!(photo.retry_count(), 1);
    assert!(h.storage.has_object(photo.storage_key().unwrap()));
}

#[tokio::test]
async fn test_partial_batch_settles_partially_failed() {
    let h = harness();
    let user_id = UserId::new();
    let job_id = h.service.create_job(user_id, 3).await.unwrap();

    let mut photo_ids = Vec::new();
    for _ in 0..3 {
        photo_ids.push(
            h.service
                .upload_photo(photo_command(user_id, Some(job_id)))
                .await
                .unwrap(),
        );
    }

    // Third photo loses its staged bytes: terminal staging miss.
    h.staging.remove(photo_ids[2]);
    for photo_id in &photo_ids {
        h.processor.process(*photo_id).await;
    }

    let job = h.jobs.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::PartiallyFailed);
    assert_eq!(job.completed_photos(), 2);
    assert_eq!(job.failed_photos(), 1);
    assert_eq!(job.overall_progress(), 67);
    assert_eq!(job.processed_percentage(), 100);
    assert!(job.completed_at().is_some());
}

#[tokio::test]
async fn test_end_to_end_upload_through_app_wiring() {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        storage: StorageConfig {
            backend: "memory".to_string(),
            bucket: None,
            region: "us-east-1".to_string(),
            endpoint_url: None,
        },
        upload: UploadPolicy::default(),
        worker: WorkerConfig::default(),
    };
    let (state, _router) = initialize_app(config).await.unwrap();
    let user_id = UserId::new();

    // Listen to the live feed like a connected client.
    let (tx, mut rx) = mpsc::channel(CONNECTION_BUFFER);
    state.broadcaster.register(user_id, tx);

    let job_id = state.uploads.create_job(user_id, 1).await.unwrap();
    let photo_id = state
        .uploads
        .upload_photo(photo_command(user_id, Some(job_id)))
        .await
        .unwrap();

    // The pool picks the photo up from the published event.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let photo = state.photos.find(photo_id).await.unwrap().unwrap();
            if photo.status() == UploadStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("photo was not processed in time");

    let job = state.jobs.find(job_id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::Completed);

    // At least the photo completion and the job terminal frame arrive.
    let mut frames = Vec::new();
    while let Ok(Some(frame)) =
        tokio::time::timeout(Duration::from_millis(200), rx.recv()).await
    {
        frames.push(frame);
    }
    assert!(frames
        .iter()
        .any(|f| f.frame_type == "photo_progress" && f.current == 100));
    assert!(frames
        .iter()
        .any(|f| f.frame_type == "job_progress" && f.status == "completed"));
}
