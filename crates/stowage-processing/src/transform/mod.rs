//! Image transform module
//!
//! - Orientation (EXIF auto-rotation)
//! - Fit-aware resizing
//! - EXIF metadata carry-over
//! - The transformer chaining them together

pub mod metadata;
pub mod orientation;
pub mod resize;
pub mod transformer;

pub use metadata::ImageMetadata;
pub use orientation::ImageOrientation;
pub use resize::ImageResize;
pub use transformer::{ImageTransformer, TransformedImage};
