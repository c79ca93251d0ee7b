//! Application configuration, loaded from the environment.

use anyhow::{Context, Result};
use std::str::FromStr;

/// Top-level configuration for the fotodrop services.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadPolicy,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Durable storage backend selection.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `"s3"` or `"memory"`.
    pub backend: String,
    pub bucket: Option<String>,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...).
    pub endpoint_url: Option<String>,
}

/// Policy knobs for individual uploads.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum accepted upload size in bytes.
    pub max_file_size: usize,
    /// Cap on explicit retries of a failed photo.
    pub max_retry_attempts: u32,
    /// Deadline for a single storage gateway put.
    pub upload_timeout_seconds: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_retry_attempts: 3,
            upload_timeout_seconds: 300,
        }
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub max_workers: usize,
    /// Bounded pipeline queue; sized to the maximum job size so a full
    /// batch can always be accepted at once.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            queue_capacity: 100,
        }
    }
}

impl Config {
    /// Loads configuration from the environment, with `.env` support.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let upload_defaults = UploadPolicy::default();
        let worker_defaults = WorkerConfig::default();

        Ok(Self {
            server: ServerConfig {
                host: env_or("FOTODROP_HOST", "0.0.0.0".to_string())?,
                port: env_or("FOTODROP_PORT", 8080)?,
            },
            storage: StorageConfig {
                backend: env_or("STORAGE_BACKEND", "memory".to_string())?,
                bucket: std::env::var("S3_BUCKET").ok(),
                region: env_or("S3_REGION", "us-east-1".to_string())?,
                endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
            },
            upload: UploadPolicy {
                max_file_size: env_or("MAX_FILE_SIZE", upload_defaults.max_file_size)?,
                max_retry_attempts: env_or(
                    "MAX_RETRY_ATTEMPTS",
                    upload_defaults.max_retry_attempts,
                )?,
                upload_timeout_seconds: env_or(
                    "UPLOAD_TIMEOUT_SECONDS",
                    upload_defaults.upload_timeout_seconds,
                )?,
            },
            worker: WorkerConfig {
                max_workers: env_or("WORKER_MAX_WORKERS", worker_defaults.max_workers)?,
                queue_capacity: env_or(
                    "WORKER_QUEUE_CAPACITY",
                    worker_defaults.queue_capacity,
                )?,
            },
        })
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.max_retry_attempts, 3);
        assert_eq!(policy.upload_timeout_seconds, 300);

        let worker = WorkerConfig::default();
        assert_eq!(worker.max_workers, 4);
        assert_eq!(worker.queue_capacity, 100);
    }
}
