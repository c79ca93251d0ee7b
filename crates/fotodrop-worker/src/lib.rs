//! Fotodrop worker – the asynchronous upload pipeline.
//!
//! `UploadProcessor` drives one photo from staged bytes to durable
//! storage; `UploadWorkerPool` consumes upload-started events from the
//! bus and runs processors concurrently behind a bounded queue.

mod pool;
mod processor;

pub use pool::{UploadPoolConfig, UploadWorkerPool};
pub use processor::{UploadProcessor, QUEUE_FULL_MESSAGE, STAGING_MISS_MESSAGE};
