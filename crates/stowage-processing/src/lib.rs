//! Stowage Image Processing Library
//!
//! This crate turns one incoming image body into one variant: auto-rotation, grayscale,
//! fit-aware resizing and output encoding. The orchestrator only sees the
//! [`TransformFactory`] / [`TransformStream`] seam.

pub mod error;
pub mod traits;

#[cfg(feature = "image")]
pub mod compression;
#[cfg(feature = "image")]
pub mod factory;
#[cfg(feature = "image")]
pub mod transform;

// Re-export commonly used types
pub use error::TransformError;
pub use traits::{TransformFactory, TransformOptions, TransformStream};

#[cfg(feature = "image")]
pub use compression::OutputFormat;
#[cfg(feature = "image")]
pub use factory::ImageTransformFactory;
#[cfg(feature = "image")]
pub use transform::{ImageOrientation, ImageResize, ImageTransformer, TransformedImage};
