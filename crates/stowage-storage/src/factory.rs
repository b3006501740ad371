#[cfg(feature = "storage-local")]
use crate::LocalGateway;
#[cfg(feature = "storage-s3")]
use crate::S3Gateway;
use crate::{StorageBackend, StorageError, StorageResult, UploadGateway};
use std::sync::Arc;
use stowage_core::GatewayConfig;

/// Create an upload gateway based on configuration
pub async fn create_gateway(config: &GatewayConfig) -> StorageResult<Arc<dyn UploadGateway>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.s3_region().map(String::from);
            let endpoint = config.s3_endpoint().map(String::from);

            let gateway = S3Gateway::new(region, endpoint).await?;
            Ok(Arc::new(gateway))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let gateway = LocalGateway::new(base_path, base_url).await?;
            Ok(Arc::new(gateway))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
