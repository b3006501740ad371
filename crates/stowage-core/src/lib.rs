//! Stowage Core Library
//!
//! This crate provides the shared configuration, variant data model, filename utilities,
//! name generation and byte-stream types used by every Stowage component.

pub mod config;
pub mod error;
pub mod filename;
pub mod naming;
pub mod storage_types;
pub mod stream;
pub mod variant;

// Re-export commonly used types
pub use config::{EngineConfig, EngineOptions, GatewayConfig};
pub use error::{ConfigError, FilenameError, NameError};
pub use naming::{NameGenerator, RandomNameGenerator};
pub use storage_types::StorageBackend;
pub use stream::{ByteStream, StreamError};
pub use variant::{FitType, Position, ResizeOptions, SizeConfig, SizeOptions, VariantSpec};
