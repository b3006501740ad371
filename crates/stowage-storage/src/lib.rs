//! Stowage Storage Library
//!
//! This crate provides the upload gateway abstraction and its implementations for
//! S3 and the local filesystem.
//!
//! An upload is started with [`UploadGateway::begin_upload`], which hands back a
//! [`BodyWriter`] to push the object body into and a completion future that resolves
//! once the object is stored. The two sides must be driven concurrently.
//!
//! # Key format
//!
//! Object keys are `{base_path}/{filename}` joined by [`keys::object_key`]. Keys must not
//! contain `..` or a leading `/`.

pub mod body;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use body::{body_channel, BodyWriter};
pub use factory::create_gateway;
#[cfg(feature = "storage-local")]
pub use local::LocalGateway;
#[cfg(feature = "storage-s3")]
pub use s3::S3Gateway;
pub use stowage_core::StorageBackend;
pub use traits::{
    DeleteParams, DeleteReceipt, PendingUpload, StorageError, StorageResult, UploadGateway,
    UploadParams, UploadReceipt,
};
