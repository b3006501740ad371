//! Upload gateway abstraction
//!
//! This module defines the UploadGateway trait that all storage backends must implement.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use stowage_core::{StorageBackend, StreamError};
use thiserror::Error;

use crate::body::BodyWriter;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// The object body delivered an error instead of data.
    #[error("Upload body failed: {0}")]
    Body(StreamError),

    /// The consuming side of the body went away before the writer finished.
    #[error("Upload body closed by the store")]
    BodyClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Parameters for one object upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadParams {
    pub bucket: String,
    pub key: String,
    /// Canned ACL, e.g. `public-read`
    pub acl: String,
}

impl UploadParams {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, acl: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            acl: acl.into(),
        }
    }

    /// All three fields are required.
    pub fn validate(&self) -> StorageResult<()> {
        for (field, value) in [("Bucket", &self.bucket), ("Key", &self.key), ("ACL", &self.acl)] {
            if value.is_empty() {
                return Err(StorageError::InvalidArgument(format!("{} is required", field)));
            }
        }
        Ok(())
    }
}

/// Parameters for one object delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteParams {
    pub bucket: String,
    pub key: String,
}

impl DeleteParams {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.bucket.is_empty() {
            return Err(StorageError::InvalidArgument("Bucket is required".to_string()));
        }
        if self.key.is_empty() {
            return Err(StorageError::InvalidArgument("Key is required".to_string()));
        }
        Ok(())
    }
}

/// What the store reports for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub location: String,
    /// Raw entity tag as reported by the store, quotes included
    pub e_tag: String,
}

/// What the store reports for a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReceipt {
    pub key: String,
    /// `false` when the backend reports the object was already absent
    pub deleted: bool,
}

/// A started upload: feed `writer`, await `completion`.
pub struct PendingUpload {
    pub writer: BodyWriter,
    pub completion: BoxFuture<'static, StorageResult<UploadReceipt>>,
}

/// Upload gateway trait
///
/// All storage backends (S3, local filesystem) must implement this trait. The gateway
/// owns its store client; bucket and key come with every call.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    /// Start an upload. Fails synchronously with `InvalidArgument` when `params` is
    /// incomplete. The completion future does nothing until polled.
    fn begin_upload(&self, params: UploadParams) -> StorageResult<PendingUpload>;

    /// Delete one object.
    async fn remove(&self, params: DeleteParams) -> StorageResult<DeleteReceipt>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
