//! Image storage engine
//!
//! [`ImageStorageEngine`] is the per-process entry point a host upload middleware calls:
//! `handle_file` stores every planned variant of one incoming file, `remove_file`
//! compensates for a session that failed part-way.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use stowage_core::filename::{extension_of, with_extension, with_suffix};
use stowage_core::{
    ByteStream, EngineConfig, NameGenerator, RandomNameGenerator, VariantSpec,
};
use stowage_processing::{TransformFactory, TransformOptions};
use stowage_storage::keys::{object_key, public_url};
use stowage_storage::{DeleteParams, DeleteReceipt, UploadGateway, UploadParams};
use tokio::task::JoinSet;

use crate::error::EngineError;
use crate::pipeline::{PipelineOutcome, PipelineTask};
use crate::planner;
use crate::registry::InFlightRegistry;
use crate::session::{SessionState, UploadSession};
use crate::tee::{StreamTee, DEFAULT_TAP_CAPACITY};

/// Extension of the web-optimized alternate
pub const WEB_EXTENSION: &str = "webp";

/// One incoming upload as handed over by the host middleware.
pub struct IncomingFile {
    /// Host-provided original filename; identifies the upload in the registry
    pub original_name: String,
    pub stream: ByteStream,
}

impl IncomingFile {
    pub fn new(original_name: impl Into<String>, stream: ByteStream) -> Self {
        Self {
            original_name: original_name.into(),
            stream,
        }
    }
}

/// One stored variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub name: String,
    #[serde(rename = "type")]
    pub variant_label: String,
    pub url: String,
    #[serde(rename = "eTag")]
    pub content_hash: String,
}

/// Result of a successful `handle_file`, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoredFiles {
    pub files: Vec<StoredFile>,
}

/// Result of `remove_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// No registry entry existed for the identity
    NothingToCompensate,
    /// One receipt per registered key, in dispatch order
    Deleted(Vec<DeleteReceipt>),
}

impl Removal {
    pub fn deleted_keys(&self) -> Vec<&str> {
        match self {
            Removal::NothingToCompensate => Vec::new(),
            Removal::Deleted(receipts) => receipts.iter().map(|r| r.key.as_str()).collect(),
        }
    }
}

/// Storage engine contract consumed by a host upload middleware.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Store every planned variant of `file`. Either all succeed or the first failure
    /// is returned; the registry entry is then kept for [`StorageEngine::remove_file`].
    async fn handle_file(&self, file: IncomingFile) -> Result<StoredFiles, EngineError>;

    /// Delete whatever is still registered for `original_name`.
    async fn remove_file(&self, original_name: &str) -> Result<Removal, EngineError>;
}

/// Builder for [`ImageStorageEngine`]
pub struct ImageStorageEngineBuilder {
    config: EngineConfig,
    gateway: Arc<dyn UploadGateway>,
    names: Option<Arc<dyn NameGenerator>>,
    transforms: Option<Arc<dyn TransformFactory>>,
    registry: Option<Arc<InFlightRegistry>>,
    tap_capacity: usize,
}

impl ImageStorageEngineBuilder {
    pub fn name_generator(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = Some(names);
        self
    }

    pub fn transform_factory(mut self, transforms: Arc<dyn TransformFactory>) -> Self {
        self.transforms = Some(transforms);
        self
    }

    /// Share a registry between engines (e.g. one per route with one removal path).
    pub fn registry(mut self, registry: Arc<InFlightRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Chunks buffered per variant before the source is paused
    pub fn tap_capacity(mut self, capacity: usize) -> Self {
        self.tap_capacity = capacity;
        self
    }

    pub fn build(self) -> ImageStorageEngine {
        ImageStorageEngine {
            config: Arc::new(self.config),
            gateway: self.gateway,
            names: self
                .names
                .unwrap_or_else(|| Arc::new(RandomNameGenerator::new())),
            transforms: self
                .transforms
                .unwrap_or_else(|| Arc::new(stowage_processing::ImageTransformFactory::new())),
            registry: self.registry.unwrap_or_default(),
            tap_capacity: self.tap_capacity,
        }
    }
}

/// Fans each upload out into one transform→upload pipeline per planned variant.
#[derive(Clone)]
pub struct ImageStorageEngine {
    config: Arc<EngineConfig>,
    gateway: Arc<dyn UploadGateway>,
    names: Arc<dyn NameGenerator>,
    transforms: Arc<dyn TransformFactory>,
    registry: Arc<InFlightRegistry>,
    tap_capacity: usize,
}

impl ImageStorageEngine {
    pub fn builder(config: EngineConfig, gateway: Arc<dyn UploadGateway>) -> ImageStorageEngineBuilder {
        ImageStorageEngineBuilder {
            config,
            gateway,
            names: None,
            transforms: None,
            registry: None,
            tap_capacity: DEFAULT_TAP_CAPACITY,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InFlightRegistry> {
        &self.registry
    }

    /// The variant plan every upload goes through.
    pub fn plan(&self) -> Vec<VariantSpec> {
        planner::expand(&self.config)
    }

    /// Build one pipeline per variant (plus web alternates) over taps of `tee`, registering
    /// each destination key as it is computed. Nothing runs until the tasks are polled.
    fn dispatch(
        &self,
        session: &UploadSession,
        base_name: &str,
        plan: &[VariantSpec],
        tee: &mut StreamTee,
    ) -> Result<Vec<PipelineTask>, EngineError> {
        let options = TransformOptions::from_config(&self.config);
        let mut tasks = Vec::with_capacity(plan.len());

        for variant in plan {
            let label = variant.label.as_deref();
            let filename = with_suffix(base_name, label)?;
            tasks.push(self.dispatch_one(session, filename, &options, variant, tee)?);

            if variant.produces_web_alternate {
                let web_name = with_extension(base_name, WEB_EXTENSION)?;
                let filename = with_suffix(&web_name, label)?;
                tasks.push(self.dispatch_one(
                    session,
                    filename,
                    &options.web_alternate(),
                    variant,
                    tee,
                )?);
            }
        }

        Ok(tasks)
    }

    fn dispatch_one(
        &self,
        session: &UploadSession,
        filename: String,
        options: &TransformOptions,
        variant: &VariantSpec,
        tee: &mut StreamTee,
    ) -> Result<PipelineTask, EngineError> {
        let key = object_key(&self.config.s3_path, &filename);
        self.registry.append(session.original_name(), key.clone());

        let transform = self.transforms.create_stream(options, variant)?;
        let upload = self.gateway.begin_upload(UploadParams::new(
            self.config.bucket.clone(),
            key.clone(),
            self.config.acl.clone(),
        ))?;

        tracing::debug!(
            original_name = %session.original_name(),
            key = %key,
            variant = variant.variant_label(),
            web_p = options.web_p,
            "Pipeline dispatched"
        );

        Ok(PipelineTask::new(
            filename,
            key,
            variant.variant_label().to_string(),
            tee.tap(),
            transform,
            upload,
        ))
    }

    /// Run every pipeline and the source pump concurrently. The first failure aborts
    /// the remaining pipelines and is returned.
    async fn await_all(
        &self,
        tee: StreamTee,
        tasks: Vec<PipelineTask>,
    ) -> Result<Vec<PipelineOutcome>, EngineError> {
        let count = tasks.len();
        let mut running = JoinSet::new();
        for (index, task) in tasks.into_iter().enumerate() {
            running.spawn(async move { (index, task.run().await) });
        }
        let source = tokio::spawn(tee.run());

        let mut outcomes: Vec<Option<PipelineOutcome>> = (0..count).map(|_| None).collect();
        while let Some(joined) = running.join_next().await {
            let failure = match joined {
                Ok((index, Ok(outcome))) => {
                    outcomes[index] = Some(outcome);
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(e) => EngineError::TaskFailed(e.to_string()),
            };
            running.abort_all();
            source.abort();
            return Err(failure);
        }

        match source.await {
            Ok(Ok(size)) => tracing::debug!(size_bytes = size, "Source stream consumed"),
            Ok(Err(e)) => tracing::debug!(error = %e, "Source stream ended with error"),
            Err(e) => tracing::warn!(error = %e, "Source pump task failed"),
        }

        Ok(outcomes.into_iter().flatten().collect())
    }

    fn assemble(&self, base_name: &str, outcomes: Vec<PipelineOutcome>) -> StoredFiles {
        let files = outcomes
            .into_iter()
            .map(|outcome| {
                // CDN URLs are always built from the primary filename
                let url = if self.config.has_cdn() {
                    public_url(&self.config.cdn, &self.config.s3_path, base_name)
                } else {
                    outcome.receipt.location
                };
                StoredFile {
                    name: outcome.filename,
                    variant_label: outcome.variant_label,
                    url,
                    content_hash: unquote_etag(&outcome.receipt.e_tag),
                }
            })
            .collect();
        StoredFiles { files }
    }
}

/// Strip every quote character from a store-reported entity tag.
pub fn unquote_etag(e_tag: &str) -> String {
    e_tag.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

#[async_trait]
impl StorageEngine for ImageStorageEngine {
    async fn handle_file(&self, file: IncomingFile) -> Result<StoredFiles, EngineError> {
        let IncomingFile {
            original_name,
            stream,
        } = file;
        let mut session = UploadSession::new(original_name.clone());
        let extension = extension_of(&original_name);

        if let Err(e) = self.transforms.accepts(extension) {
            let e = EngineError::from(e);
            session.fail(&e);
            return Err(e);
        }

        let base_name = match self.names.generate(extension) {
            Ok(name) => name,
            Err(e) => {
                let e = EngineError::from(e);
                session.fail(&e);
                return Err(e);
            }
        };
        session.set_base_name(base_name.clone());
        self.registry.register(&original_name);
        let plan = planner::expand(&self.config);

        session.advance(SessionState::Dispatching);
        let mut tee = StreamTee::new(stream, self.tap_capacity);
        let tasks = match self.dispatch(&session, &base_name, &plan, &mut tee) {
            Ok(tasks) => tasks,
            Err(e) => {
                session.fail(&e);
                return Err(e);
            }
        };

        session.advance(SessionState::AwaitingCompletion);
        let outcomes = match self.await_all(tee, tasks).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                session.fail(&e);
                return Err(e);
            }
        };

        let stored = self.assemble(&base_name, outcomes);
        self.registry.deregister(&original_name);
        session.advance(SessionState::Succeeded);

        tracing::info!(
            original_name = %original_name,
            base_name = %base_name,
            variants = plan.len(),
            files = stored.files.len(),
            "Upload stored"
        );

        Ok(stored)
    }

    async fn remove_file(&self, original_name: &str) -> Result<Removal, EngineError> {
        let Some(keys) = self.registry.take(original_name) else {
            tracing::debug!(original_name = %original_name, "Nothing to compensate");
            return Ok(Removal::NothingToCompensate);
        };

        tracing::info!(
            original_name = %original_name,
            keys = keys.len(),
            "Removing in-flight objects"
        );

        let deletes = keys.into_iter().map(|key| {
            self.gateway
                .remove(DeleteParams::new(self.config.bucket.clone(), key))
        });
        let receipts = try_join_all(deletes).await?;

        Ok(Removal::Deleted(receipts))
    }
}
