use anyhow::Context;
use std::path::Path;
use stowage_core::{EngineConfig, EngineOptions};

/// Load engine options from `path`, or start from the defaults when none is given.
///
/// Unset `bucket`, `s3Path` and `cdn` fall back to `S3_BUCKET`, `S3_PATH` and `CDN_HOST`.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let options = match path {
        Some(path) => EngineOptions::from_json_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => EngineOptions::default(),
    };
    EngineConfig::from_options(options).context("Invalid engine options")
}

/// Identity a local file is registered under: its file name without directories.
pub fn original_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
