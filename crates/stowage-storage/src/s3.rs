use crate::body::{body_channel, DEFAULT_BODY_CAPACITY};
use crate::keys::content_type_for_key;
use crate::traits::{
    DeleteParams, DeleteReceipt, PendingUpload, StorageError, StorageResult, UploadGateway,
    UploadParams, UploadReceipt,
};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream as S3Body;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use aws_sdk_s3::Client;
use bytes::{Bytes, BytesMut};
use futures::{FutureExt, StreamExt};
use std::time::Instant;
use stowage_core::ByteStream;

// Use multipart upload for bodies larger than 5MB, otherwise a single put
const MULTIPART_THRESHOLD: usize = 5 * 1024 * 1024;
// 5MB per part (minimum is 5MB except last part)
const PART_SIZE: usize = 5 * 1024 * 1024;

/// S3 upload gateway
#[derive(Clone)]
pub struct S3Gateway {
    client: Client,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Gateway {
    /// Create a new S3Gateway instance
    ///
    /// # Arguments
    /// * `region` - AWS region; `None` uses the default provider chain
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(region: Option<String>, endpoint_url: Option<String>) -> StorageResult<Self> {
        let region_provider = match region {
            Some(region) => RegionProviderChain::first_try(aws_config::Region::new(region)),
            None => RegionProviderChain::default_provider(),
        };

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config.clone())
            .load()
            .await;

        let region = config
            .region()
            .map(|r| r.as_ref().to_string())
            .ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

        let client = if let Some(ref endpoint) = endpoint_url {
            // Path-style addressing is required for MinIO and most S3-compatible providers
            let s3_config = aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .retry_config(retry_config)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&config)
        };

        Ok(S3Gateway {
            client,
            region,
            endpoint_url,
        })
    }

    /// Public URL for an object when the store does not report one
    ///
    /// For AWS S3: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers (path-style): {endpoint}/{bucket}/{key}
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key)
        }
    }

    async fn upload_body(self, params: UploadParams, mut body: ByteStream) -> StorageResult<UploadReceipt> {
        let start = Instant::now();
        let mut buffer = BytesMut::new();

        while buffer.len() <= MULTIPART_THRESHOLD {
            match body.next().await {
                Some(chunk) => buffer.extend_from_slice(&chunk.map_err(StorageError::Body)?),
                None => return self.put_single(&params, buffer.freeze(), start).await,
            }
        }

        self.put_multipart(&params, buffer, body, start).await
    }

    async fn put_single(
        &self,
        params: &UploadParams,
        data: Bytes,
        start: Instant,
    ) -> StorageResult<UploadReceipt> {
        let size = data.len() as u64;

        let output = self
            .client
            .put_object()
            .bucket(&params.bucket)
            .key(&params.key)
            .acl(ObjectCannedAcl::from(params.acl.as_str()))
            .content_type(content_type_for_key(&params.key))
            .body(S3Body::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %params.bucket,
                    key = %params.key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %params.bucket,
            key = %params.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(UploadReceipt {
            location: self.generate_url(&params.bucket, &params.key),
            e_tag: output.e_tag().unwrap_or_default().to_string(),
        })
    }

    async fn put_multipart(
        &self,
        params: &UploadParams,
        buffer: BytesMut,
        body: ByteStream,
        start: Instant,
    ) -> StorageResult<UploadReceipt> {
        let create_result = self
            .client
            .create_multipart_upload()
            .bucket(&params.bucket)
            .key(&params.key)
            .acl(ObjectCannedAcl::from(params.acl.as_str()))
            .content_type(content_type_for_key(&params.key))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %params.bucket,
                    key = %params.key,
                    "Failed to create multipart upload"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let upload_id = create_result
            .upload_id()
            .ok_or_else(|| StorageError::UploadFailed("No upload ID returned".to_string()))?
            .to_string();

        match self.upload_parts(params, &upload_id, buffer, body).await {
            Ok((parts, total_size)) => {
                let part_count = parts.len();
                let completed_parts = CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build();

                let output = self
                    .client
                    .complete_multipart_upload()
                    .bucket(&params.bucket)
                    .key(&params.key)
                    .upload_id(&upload_id)
                    .multipart_upload(completed_parts)
                    .send()
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            error = %e,
                            bucket = %params.bucket,
                            key = %params.key,
                            "Failed to complete multipart upload"
                        );
                        StorageError::UploadFailed(e.to_string())
                    })?;

                tracing::info!(
                    bucket = %params.bucket,
                    key = %params.key,
                    size_bytes = total_size,
                    parts = part_count,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 multipart upload successful"
                );

                Ok(UploadReceipt {
                    location: output
                        .location()
                        .map(String::from)
                        .unwrap_or_else(|| self.generate_url(&params.bucket, &params.key)),
                    e_tag: output.e_tag().unwrap_or_default().to_string(),
                })
            }
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&params.bucket)
                    .key(&params.key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %params.bucket,
                        key = %params.key,
                        "Failed to abort multipart upload"
                    );
                }
                Err(e)
            }
        }
    }

    /// Upload `buffer` and the rest of `body` as parts of `upload_id`.
    async fn upload_parts(
        &self,
        params: &UploadParams,
        upload_id: &str,
        mut buffer: BytesMut,
        mut body: ByteStream,
    ) -> StorageResult<(Vec<CompletedPart>, u64)> {
        let mut parts = Vec::new();
        let mut total_size = 0u64;
        let mut part_number = 1i32;
        let mut finished = false;

        loop {
            while buffer.len() >= PART_SIZE || (finished && !buffer.is_empty()) {
                let take = buffer.len().min(PART_SIZE);
                let part_data = buffer.split_to(take).freeze();
                total_size += part_data.len() as u64;

                let upload_part_result = self
                    .client
                    .upload_part()
                    .bucket(&params.bucket)
                    .key(&params.key)
                    .upload_id(upload_id)
                    .part_number(part_number)
                    .body(S3Body::from(part_data))
                    .send()
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            error = %e,
                            bucket = %params.bucket,
                            key = %params.key,
                            part_number = part_number,
                            "Failed to upload part"
                        );
                        StorageError::UploadFailed(e.to_string())
                    })?;

                let etag = upload_part_result
                    .e_tag()
                    .ok_or_else(|| {
                        StorageError::UploadFailed(format!(
                            "No ETag returned for part {}",
                            part_number
                        ))
                    })?
                    .to_string();

                parts.push(
                    CompletedPart::builder()
                        .part_number(part_number)
                        .e_tag(etag)
                        .build(),
                );
                part_number += 1;
            }

            if finished {
                break;
            }

            match body.next().await {
                Some(chunk) => buffer.extend_from_slice(&chunk.map_err(StorageError::Body)?),
                None => finished = true,
            }
        }

        Ok((parts, total_size))
    }
}

#[async_trait]
impl UploadGateway for S3Gateway {
    fn begin_upload(&self, params: UploadParams) -> StorageResult<PendingUpload> {
        params.validate()?;

        let (writer, body) = body_channel(DEFAULT_BODY_CAPACITY);
        let gateway = self.clone();
        let completion = gateway.upload_body(params, body).boxed();

        Ok(PendingUpload { writer, completion })
    }

    async fn remove(&self, params: DeleteParams) -> StorageResult<DeleteReceipt> {
        params.validate()?;
        let start = Instant::now();

        self.client
            .delete_object()
            .bucket(&params.bucket)
            .key(&params.key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %params.bucket,
                    key = %params.key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                StorageError::DeleteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %params.bucket,
            key = %params.key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(DeleteReceipt {
            key: params.key,
            deleted: true,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
