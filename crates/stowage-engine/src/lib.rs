//! Stowage Engine
//!
//! Orchestrates one upload: names it, expands the configured size list into variants,
//! tees the incoming body into one transform→upload pipeline per variant and reports
//! the stored files. Destination keys are tracked in an [`InFlightRegistry`] so a failed
//! upload can be compensated with [`StorageEngine::remove_file`].

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod planner;
pub mod registry;
pub mod session;
pub mod tee;

pub use engine::{
    ImageStorageEngine, ImageStorageEngineBuilder, IncomingFile, Removal, StorageEngine,
    StoredFile, StoredFiles,
};
pub use error::{EngineError, ErrorMetadata, LogLevel};
pub use pipeline::{PipelineOutcome, PipelineTask};
pub use registry::InFlightRegistry;
pub use session::{SessionState, UploadSession};
pub use tee::StreamTee;
