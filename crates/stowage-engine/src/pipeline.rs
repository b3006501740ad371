//! One transform→upload execution for one variant.

use futures::StreamExt;
use stowage_core::ByteStream;
use stowage_processing::TransformStream;
use stowage_storage::{BodyWriter, PendingUpload, StorageError, UploadReceipt};

use crate::error::EngineError;

/// A dispatched, not yet running, pipeline.
pub struct PipelineTask {
    /// Destination filename, without the base path
    pub filename: String,
    /// Destination object key
    pub key: String,
    /// `original` for the unsuffixed variant, else the size name
    pub variant_label: String,
    input: ByteStream,
    transform: Box<dyn TransformStream>,
    upload: PendingUpload,
}

/// What a finished pipeline reports.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub filename: String,
    pub key: String,
    pub variant_label: String,
    pub receipt: UploadReceipt,
}

impl PipelineTask {
    pub fn new(
        filename: String,
        key: String,
        variant_label: String,
        input: ByteStream,
        transform: Box<dyn TransformStream>,
        upload: PendingUpload,
    ) -> Self {
        Self {
            filename,
            key,
            variant_label,
            input,
            transform,
            upload,
        }
    }

    /// Drive the transformed body into the store and wait for the store's answer.
    pub async fn run(self) -> Result<PipelineOutcome, EngineError> {
        let PipelineTask {
            filename,
            key,
            variant_label,
            input,
            transform,
            upload,
        } = self;
        let PendingUpload { writer, completion } = upload;

        let output = transform.pipe(input);
        let (pumped, stored) = tokio::join!(pump(output, writer), completion);

        // The store's own error is the more precise one; a failed pump usually just
        // reflects it.
        let receipt = stored?;
        let size = pumped?;

        tracing::debug!(
            key = %key,
            variant = %variant_label,
            size_bytes = size,
            "Pipeline completed"
        );

        Ok(PipelineOutcome {
            filename,
            key,
            variant_label,
            receipt,
        })
    }
}

/// Copy `output` into `writer`, ending the body with the first error it carries.
async fn pump(mut output: ByteStream, writer: BodyWriter) -> Result<u64, StorageError> {
    let mut total = 0u64;
    while let Some(chunk) = output.next().await {
        match chunk {
            Ok(chunk) => {
                total += chunk.len() as u64;
                writer.write(chunk).await?;
            }
            Err(e) => {
                writer.abort(e.clone()).await;
                return Err(StorageError::Body(e));
            }
        }
    }
    writer.finish();
    Ok(total)
}
