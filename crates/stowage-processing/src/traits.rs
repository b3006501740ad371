//! Core traits for image transforms
//!
//! A [`TransformFactory`] validates a variant and hands back a [`TransformStream`], a
//! one-shot stage that maps an input body stream to an output body stream.

use stowage_core::{ByteStream, EngineConfig, VariantSpec};

use crate::error::TransformError;

/// Per-pipeline transform switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Apply EXIF-driven auto-rotation
    pub rotate: bool,
    pub grayscale: bool,
    /// Carry the source EXIF block over to the output
    pub with_metadata: bool,
    /// Force WebP output
    pub web_p: bool,
}

impl TransformOptions {
    /// Options for the primary output of a variant.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            rotate: config.rotate,
            grayscale: config.grayscale,
            with_metadata: config.with_metadata,
            web_p: false,
        }
    }

    /// Same options with WebP output forced on.
    pub fn web_alternate(self) -> Self {
        Self {
            web_p: true,
            ..self
        }
    }
}

/// Builds transform stages for variants.
pub trait TransformFactory: Send + Sync {
    /// Check that sources with `extension` can be transformed at all, before any
    /// variant is dispatched.
    fn accepts(&self, _extension: Option<&str>) -> Result<(), TransformError> {
        Ok(())
    }

    /// Validate `variant` and build its stage. Fails before any byte is read.
    fn create_stream(
        &self,
        options: &TransformOptions,
        variant: &VariantSpec,
    ) -> Result<Box<dyn TransformStream>, TransformError>;
}

/// A one-shot body transformer.
pub trait TransformStream: Send {
    /// Consume `input` and return the transformed body. Failures are delivered as
    /// [`stowage_core::StreamError::Transform`] items on the returned stream.
    fn pipe(self: Box<Self>, input: ByteStream) -> ByteStream;
}
