//! Fotodrop storage – durable object storage gateway.
//!
//! The `ObjectStorage` trait is the contract the upload pipeline consumes;
//! `S3Storage` is the production backend, `MemoryStorage` backs tests and
//! local runs.

mod memory;
mod s3;
mod traits;

pub use memory::MemoryStorage;
pub use s3::S3Storage;
pub use traits::{ObjectStorage, StorageError, StorageResult};
