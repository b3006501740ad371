//! Configuration module
//!
//! `EngineOptions` is the user-facing, partially specified option set. `EngineConfig` is
//! the validated result of merging those options over the defaults and the environment.
//! `GatewayConfig` selects and parameterizes the storage backend.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::ConfigError;
use crate::storage_types::StorageBackend;
use crate::variant::{FitType, SizeConfig};

// Defaults
const DEFAULT_ACL: &str = "public-read";
const DEFAULT_ROTATE: bool = true;
const DEFAULT_WEB_P: bool = false;

/// Options accepted by the storage engine. Unset fields fall back to defaults or env.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_metadata: Option<bool>,
    #[serde(default, rename = "webP", skip_serializing_if = "Option::is_none")]
    pub web_p: Option<bool>,
    /// Kept as text so an invalid value surfaces as `ConfigError::InvalidFit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<SizeConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<String>,
}

impl EngineOptions {
    /// Load options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// Validated engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub acl: String,
    pub rotate: bool,
    pub grayscale: bool,
    pub with_metadata: bool,
    #[serde(rename = "webP")]
    pub web_p: bool,
    pub fit: FitType,
    pub sizes: Vec<SizeConfig>,
    pub bucket: String,
    pub s3_path: String,
    pub cdn: String,
}

impl EngineConfig {
    /// Merge `options` over the defaults, using the process environment for fallbacks.
    pub fn from_options(options: EngineOptions) -> Result<Self, ConfigError> {
        Self::from_options_with(options, |key| env::var(key).ok())
    }

    /// Merge `options` over the defaults, resolving fallbacks through `lookup`.
    ///
    /// `bucket`, `s3Path` and `cdn` fall back to `S3_BUCKET`, `S3_PATH` and `CDN_HOST`.
    pub fn from_options_with<F>(options: EngineOptions, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fit = match options.fit.as_deref() {
            Some(fit) => fit.parse::<FitType>()?,
            None => FitType::default(),
        };

        let bucket = non_empty(options.bucket)
            .or_else(|| non_empty(lookup("S3_BUCKET")))
            .ok_or(ConfigError::MissingBucket)?;
        let s3_path = non_empty(options.s3_path)
            .or_else(|| non_empty(lookup("S3_PATH")))
            .unwrap_or_default();
        let cdn = non_empty(options.cdn)
            .or_else(|| non_empty(lookup("CDN_HOST")))
            .unwrap_or_default();

        // An explicit empty list is kept: it means "store nothing".
        let sizes = options
            .sizes
            .unwrap_or_else(|| vec![SizeConfig::default()]);

        tracing::debug!(
            bucket = %bucket,
            s3_path = %s3_path,
            cdn = %cdn,
            fit = %fit,
            sizes = sizes.len(),
            "Engine configuration resolved"
        );

        Ok(EngineConfig {
            acl: options.acl.unwrap_or_else(|| DEFAULT_ACL.to_string()),
            rotate: options.rotate.unwrap_or(DEFAULT_ROTATE),
            grayscale: options.grayscale.unwrap_or(false),
            with_metadata: options.with_metadata.unwrap_or(false),
            web_p: options.web_p.unwrap_or(DEFAULT_WEB_P),
            fit,
            sizes,
            bucket,
            s3_path,
            cdn,
        })
    }

    /// Whether reported URLs are rewritten onto a CDN host.
    pub fn has_cdn(&self) -> bool {
        !self.cdn.is_empty()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Storage gateway configuration
#[derive(Clone, Debug, Default)]
pub struct GatewayConfig {
    pub storage_backend: StorageBackend,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::default(),
        };

        let config = GatewayConfig {
            storage_backend,
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
        };

        tracing::debug!(
            backend = %config.storage_backend,
            s3_region = config.s3_region.as_deref().unwrap_or_default(),
            s3_endpoint = config.s3_endpoint.as_deref().unwrap_or_default(),
            "Gateway configuration loaded"
        );

        Ok(config)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }
}
