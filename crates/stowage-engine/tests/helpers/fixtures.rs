use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use stowage_core::error::NameError;
use stowage_core::stream::from_chunks;
use stowage_core::{ByteStream, NameGenerator, RandomNameGenerator, VariantSpec};
use stowage_processing::{TransformError, TransformFactory, TransformOptions, TransformStream};

/// Base name stem every test upload gets.
pub const STEM: &str = "ab12ef";

/// Name generator with a fixed stem and the real extension normalization.
pub struct FixedNames;

impl NameGenerator for FixedNames {
    fn generate(&self, source_extension: Option<&str>) -> Result<String, NameError> {
        Ok(match source_extension {
            Some(ext) => format!(
                "{}.{}",
                STEM,
                RandomNameGenerator::normalize_extension(ext)
            ),
            None => STEM.to_string(),
        })
    }
}

/// Name generator yielding `n0.ext`, `n1.ext`, ... so concurrent sessions never share keys.
#[derive(Default)]
pub struct SequentialNames {
    next: AtomicUsize,
}

impl NameGenerator for SequentialNames {
    fn generate(&self, source_extension: Option<&str>) -> Result<String, NameError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(format!("n{}.{}", n, source_extension.unwrap_or("bin")))
    }
}

/// Name generator that always fails.
pub struct BrokenNames;

impl NameGenerator for BrokenNames {
    fn generate(&self, _source_extension: Option<&str>) -> Result<String, NameError> {
        Err(NameError::Randomness("entropy unavailable".to_string()))
    }
}

/// Transform factory that passes bodies through unchanged and records what it built.
#[derive(Default)]
pub struct PassThrough {
    pub built: Mutex<Vec<(Option<String>, TransformOptions)>>,
}

impl PassThrough {
    pub fn web_flags(&self) -> Vec<bool> {
        self.built
            .lock()
            .unwrap()
            .iter()
            .map(|(_, options)| options.web_p)
            .collect()
    }
}

struct Identity;

impl TransformStream for Identity {
    fn pipe(self: Box<Self>, input: ByteStream) -> ByteStream {
        input
    }
}

impl TransformFactory for PassThrough {
    fn create_stream(
        &self,
        options: &TransformOptions,
        variant: &VariantSpec,
    ) -> Result<Box<dyn TransformStream>, TransformError> {
        if variant.width == Some(0) {
            return Err(TransformError::InvalidDimension {
                dimension: "width",
                value: 0,
                max: 16_384,
            });
        }
        self.built
            .lock()
            .unwrap()
            .push((variant.label.clone(), *options));
        Ok(Box::new(Identity))
    }
}

/// A small multi-chunk body.
pub fn body() -> ByteStream {
    from_chunks(vec![
        Bytes::from_static(b"GIF89a"),
        Bytes::from_static(b"-pixels-"),
        Bytes::from_static(b"end"),
    ])
}

pub const BODY: &[u8] = b"GIF89a-pixels-end";

/// A solid-colour GIF.
pub fn gif(width: u32, height: u32) -> Bytes {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 90, 200, 255])));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif)
        .expect("Failed to encode test GIF");
    Bytes::from(buffer)
}
