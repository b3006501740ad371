//! Engine error types
//!
//! `EngineError` unifies every failure a session or a removal can surface. Body-level
//! failures that reach the store are attributed back to the stage that caused them.

use stowage_core::{ConfigError, FilenameError, NameError, StreamError};
use stowage_processing::TransformError;
use stowage_storage::StorageError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures such as bad input
    Debug,
    /// Recoverable issues
    Warn,
    /// Unexpected failures
    Error,
}

/// How an error should be reported and whether it is worth retrying.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same call may succeed
    fn is_retryable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Name generation failed: {0}")]
    NameGeneration(#[from] NameError),

    #[error("Invalid filename: {0}")]
    Filename(#[from] FilenameError),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Store operation failed: {0}")]
    Store(#[source] StorageError),

    #[error("Source stream failed: {0}")]
    Source(String),

    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),
}

impl From<TransformError> for EngineError {
    fn from(err: TransformError) -> Self {
        EngineError::Transform(err.to_string())
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Body(StreamError::Transform(msg)) => EngineError::Transform(msg),
            StorageError::Body(StreamError::Source(msg)) => EngineError::Source(msg),
            other => EngineError::Store(other),
        }
    }
}

impl ErrorMetadata for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            EngineError::Config(_) => "CONFIGURATION_ERROR",
            EngineError::NameGeneration(_) => "NAME_GENERATION_ERROR",
            EngineError::Filename(_) => "INVALID_FILENAME",
            EngineError::Transform(_) => "TRANSFORM_ERROR",
            EngineError::Store(_) => "STORE_ERROR",
            EngineError::Source(_) => "SOURCE_STREAM_ERROR",
            EngineError::TaskFailed(_) => "TASK_FAILED",
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            EngineError::Store(StorageError::InvalidArgument(_))
            | EngineError::Store(StorageError::ConfigError(_)) => false,
            EngineError::Store(_) | EngineError::Source(_) | EngineError::TaskFailed(_) => true,
            EngineError::NameGeneration(_) => true,
            EngineError::Config(_) | EngineError::Filename(_) | EngineError::Transform(_) => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            EngineError::Config(_) | EngineError::Filename(_) | EngineError::Transform(_) => {
                LogLevel::Debug
            }
            EngineError::Source(_) => LogLevel::Warn,
            EngineError::NameGeneration(_) | EngineError::Store(_) | EngineError::TaskFailed(_) => {
                LogLevel::Error
            }
        }
    }
}
