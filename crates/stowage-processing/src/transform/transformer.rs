//! Image transformer - turns one source body into one encoded variant
//!
//! Steps, in order:
//! 1. Decode (format sniffed from content)
//! 2. EXIF auto-rotation (if enabled)
//! 3. Grayscale (if enabled)
//! 4. Fit-aware resize
//! 5. Format selection and encoding
//! 6. EXIF carry-over (if enabled)

use bytes::Bytes;
use image::{GenericImageView, ImageReader};
use std::io::Cursor;
use stowage_core::VariantSpec;

use crate::compression::OutputFormat;
use crate::error::TransformError;
use crate::traits::TransformOptions;
use crate::transform::metadata::ImageMetadata;
use crate::transform::orientation::ImageOrientation;
use crate::transform::resize::ImageResize;

/// Encoded output of one transform
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub data: Bytes,
    pub format: OutputFormat,
}

/// Applies a variant's transformations to a whole image
pub struct ImageTransformer;

impl ImageTransformer {
    pub fn transform(
        data: &Bytes,
        options: &TransformOptions,
        variant: &VariantSpec,
    ) -> Result<TransformedImage, TransformError> {
        if looks_like_svg(data) {
            return Err(TransformError::UnsupportedFormat("svg".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(data.as_ref()))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode(e.to_string()))?;
        let source_format = reader.format();
        let mut img = reader
            .decode()
            .map_err(|e| TransformError::Decode(e.to_string()))?;

        if options.rotate {
            img = ImageOrientation::apply_exif_orientation(img, data);
        }

        if options.grayscale {
            tracing::debug!("Applying grayscale");
            img = img.grayscale();
        }

        img = ImageResize::apply_resize(&img, variant.width, variant.height, variant.resize);

        let format = OutputFormat::select(source_format, options.web_p);
        let mut encoded = format.encode(&img)?;

        if options.with_metadata {
            encoded = ImageMetadata::preserve(data, encoded, options.rotate);
        }

        let (width, height) = img.dimensions();
        tracing::debug!(
            variant = variant.variant_label(),
            width = width,
            height = height,
            format = format.extension(),
            size_bytes = encoded.len(),
            "Image transformed"
        );

        Ok(TransformedImage {
            data: encoded,
            format,
        })
    }
}

/// Vector sources cannot be rasterized by the `image` decoders.
fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    (text.starts_with("<svg") || text.starts_with("<?xml")) && text.contains("<svg")
}
