use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::error::TransformError;

const JPEG_QUALITY: u8 = 80;
const WEBP_QUALITY: f32 = 80.0;

/// Output format for encoded variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Pick the output format for a decoded source.
    ///
    /// JPEG, PNG and WebP keep their format; everything else (GIF in practice) is written
    /// as PNG. `force_web_p` wins over the source format.
    pub fn select(source: Option<ImageFormat>, force_web_p: bool) -> Self {
        if force_web_p {
            return OutputFormat::WebP;
        }
        match source {
            Some(ImageFormat::Jpeg) => OutputFormat::Jpeg,
            Some(ImageFormat::WebP) => OutputFormat::WebP,
            _ => OutputFormat::Png,
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// Encode `img` in this format.
    pub fn encode(self, img: &DynamicImage) -> Result<Bytes, TransformError> {
        match self {
            OutputFormat::Jpeg => encode_jpeg(img),
            OutputFormat::Png => encode_png(img),
            OutputFormat::WebP => encode_webp(img),
        }
    }
}

fn encode_jpeg(img: &DynamicImage) -> Result<Bytes, TransformError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(Bytes::from(buffer))
}

fn encode_png(img: &DynamicImage) -> Result<Bytes, TransformError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    img.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(Bytes::from(buffer))
}

fn encode_webp(img: &DynamicImage) -> Result<Bytes, TransformError> {
    let (width, height) = img.dimensions();
    let rgba_img = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder.encode(WEBP_QUALITY);

    Ok(Bytes::copy_from_slice(&webp_data))
}
