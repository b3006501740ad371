//! Image transform factory
//!
//! Validates variant dimensions up front and returns a stage that buffers the input
//! body, transforms it on the blocking pool and emits the encoded result as one chunk.

use futures::StreamExt;
use stowage_core::stream::collect_body;
use stowage_core::{ByteStream, StreamError, VariantSpec};

use crate::error::TransformError;
use crate::traits::{TransformFactory, TransformOptions, TransformStream};
use crate::transform::ImageTransformer;

/// Largest accepted target width or height
pub const MAX_DIMENSION: u32 = 16_384;

/// Source extensions the raster decoders cannot read
const UNSUPPORTED_SOURCES: [&str; 1] = ["svg"];

/// [`TransformFactory`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTransformFactory;

impl ImageTransformFactory {
    pub fn new() -> Self {
        Self
    }

    fn validate_dimension(dimension: &'static str, value: Option<u32>) -> Result<(), TransformError> {
        match value {
            Some(value) if value == 0 || value > MAX_DIMENSION => {
                Err(TransformError::InvalidDimension {
                    dimension,
                    value,
                    max: MAX_DIMENSION,
                })
            }
            _ => Ok(()),
        }
    }
}

impl TransformFactory for ImageTransformFactory {
    fn accepts(&self, extension: Option<&str>) -> Result<(), TransformError> {
        match extension {
            Some(ext)
                if UNSUPPORTED_SOURCES
                    .iter()
                    .any(|unsupported| unsupported.eq_ignore_ascii_case(ext)) =>
            {
                Err(TransformError::UnsupportedFormat(ext.to_ascii_lowercase()))
            }
            _ => Ok(()),
        }
    }

    fn create_stream(
        &self,
        options: &TransformOptions,
        variant: &VariantSpec,
    ) -> Result<Box<dyn TransformStream>, TransformError> {
        Self::validate_dimension("width", variant.width)?;
        Self::validate_dimension("height", variant.height)?;

        Ok(Box::new(ImageTransformStream {
            options: *options,
            variant: variant.clone(),
        }))
    }
}

struct ImageTransformStream {
    options: TransformOptions,
    variant: VariantSpec,
}

impl ImageTransformStream {
    async fn run(self, input: ByteStream) -> Result<bytes::Bytes, StreamError> {
        let data = collect_body(input).await?;

        let ImageTransformStream { options, variant } = self;
        let transformed = tokio::task::spawn_blocking(move || {
            ImageTransformer::transform(&data, &options, &variant)
        })
        .await
        .map_err(|e| StreamError::Transform(TransformError::TaskFailed(e.to_string()).to_string()))?
        .map_err(|e| StreamError::Transform(e.to_string()))?;

        Ok(transformed.data)
    }
}

impl TransformStream for ImageTransformStream {
    fn pipe(self: Box<Self>, input: ByteStream) -> ByteStream {
        futures::stream::once((*self).run(input)).boxed()
    }
}
