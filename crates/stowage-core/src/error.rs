//! Error types module
//!
//! Errors raised by the core building blocks. Each one is fatal for the operation that
//! produced it; none of them is retried internally.

use std::io;

/// Invalid engine or gateway configuration. Raised at construction time only.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid fit '{0}' (cover|contain|fill|inside|outside)")]
    InvalidFit(String),

    #[error("Invalid position '{0}'")]
    InvalidPosition(String),

    #[error("A valid bucket must be provided through options or env.S3_BUCKET")]
    MissingBucket,

    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read options: {0}")]
    Io(#[from] io::Error),
}

/// Filename manipulation received an argument it cannot work with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Random name generation failed before any upload started.
#[derive(Debug, thiserror::Error)]
pub enum NameError {
    #[error("Entropy source failed: {0}")]
    Randomness(String),
}
