//! Transform error types

/// Errors raised while building or running an image transform.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Raised synchronously when a transform stream is constructed.
    #[error("Invalid {dimension}: {value} (must be between 1 and {max})")]
    InvalidDimension {
        dimension: &'static str,
        value: u32,
        max: u32,
    },

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Transform task failed: {0}")]
    TaskFailed(String),
}
