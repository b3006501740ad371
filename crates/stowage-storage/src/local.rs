use crate::body::{body_channel, DEFAULT_BODY_CAPACITY};
use crate::keys::join_segments;
use crate::traits::{
    DeleteParams, DeleteReceipt, PendingUpload, StorageError, StorageResult, UploadGateway,
    UploadParams, UploadReceipt,
};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use stowage_core::ByteStream;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem upload gateway
///
/// Buckets are sub-directories of the base path.
#[derive(Clone)]
pub struct LocalGateway {
    base_path: PathBuf,
    base_url: String,
}

impl LocalGateway {
    /// Create a new LocalGateway instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/stowage")
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalGateway {
            base_path,
            base_url,
        })
    }

    /// Convert bucket and key to a filesystem path, refusing anything that could escape
    /// the base directory.
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        for part in [bucket, key] {
            if part.contains("..") || part.starts_with('/') || part.contains('\\') {
                return Err(StorageError::InvalidArgument(format!(
                    "Invalid path component: {}",
                    part
                )));
            }
        }
        if bucket.contains('/') {
            return Err(StorageError::InvalidArgument(format!(
                "Bucket must be a single path component: {}",
                bucket
            )));
        }

        Ok(self.base_path.join(bucket).join(key))
    }

    /// Generate public URL for an object
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        join_segments(&[&self.base_url, bucket, key])
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_body(
        self,
        params: UploadParams,
        path: PathBuf,
        mut body: ByteStream,
    ) -> StorageResult<UploadReceipt> {
        let start = Instant::now();
        Self::ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut hasher = Sha256::new();
        let mut size = 0usize;
        let written: StorageResult<()> = async {
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(StorageError::Body)?;
                hasher.update(&chunk);
                size += chunk.len();
                file.write_all(&chunk).await.map_err(|e| {
                    StorageError::UploadFailed(format!(
                        "Failed to write file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
            })
        }
        .await;

        if let Err(e) = written {
            drop(file);
            // Never leave a truncated object behind
            let _ = fs::remove_file(&path).await;
            tracing::error!(
                error = %e,
                bucket = %params.bucket,
                key = %params.key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage upload failed"
            );
            return Err(e);
        }

        tracing::info!(
            path = %path.display(),
            bucket = %params.bucket,
            key = %params.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(UploadReceipt {
            location: self.generate_url(&params.bucket, &params.key),
            // Quoted like an S3 entity tag
            e_tag: format!("\"{}\"", hex::encode(hasher.finalize())),
        })
    }
}

#[async_trait]
impl UploadGateway for LocalGateway {
    fn begin_upload(&self, params: UploadParams) -> StorageResult<PendingUpload> {
        params.validate()?;
        let path = self.object_path(&params.bucket, &params.key)?;

        let (writer, body) = body_channel(DEFAULT_BODY_CAPACITY);
        let completion = self.clone().write_body(params, path, body).boxed();

        Ok(PendingUpload { writer, completion })
    }

    async fn remove(&self, params: DeleteParams) -> StorageResult<DeleteReceipt> {
        params.validate()?;
        let path = self.object_path(&params.bucket, &params.key)?;
        let start = Instant::now();

        let deleted = match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %params.bucket,
                    key = %params.key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage delete failed"
                );
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        tracing::info!(
            path = %path.display(),
            bucket = %params.bucket,
            key = %params.key,
            deleted = deleted,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(DeleteReceipt {
            key: params.key,
            deleted,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
