#![allow(dead_code)]

pub mod fixtures;
pub mod gateway;

use std::sync::Arc;
use stowage_core::{EngineConfig, EngineOptions};
use stowage_engine::ImageStorageEngine;

use fixtures::{FixedNames, PassThrough};
use gateway::MemoryGateway;

pub const TEST_BUCKET: &str = "test-bucket";

/// Engine configuration from a JSON options object, with no environment fallbacks.
pub fn config(json: &str) -> EngineConfig {
    let mut options = EngineOptions::from_json_str(json).expect("Failed to parse test options");
    if options.bucket.is_none() {
        options.bucket = Some(TEST_BUCKET.to_string());
    }
    EngineConfig::from_options_with(options, |_| None).expect("Invalid test options")
}

/// Everything a test needs to drive and inspect one engine.
pub struct TestEngine {
    pub engine: ImageStorageEngine,
    pub gateway: Arc<MemoryGateway>,
    pub transforms: Arc<PassThrough>,
}

pub fn setup_engine(json: &str) -> TestEngine {
    setup_engine_with(json, MemoryGateway::new())
}

pub fn setup_engine_with(json: &str, gateway: MemoryGateway) -> TestEngine {
    let gateway = Arc::new(gateway);
    let transforms = Arc::new(PassThrough::default());
    let engine = ImageStorageEngine::builder(config(json), gateway.clone())
        .name_generator(Arc::new(FixedNames))
        .transform_factory(transforms.clone())
        .tap_capacity(1)
        .build();
    TestEngine {
        engine,
        gateway,
        transforms,
    }
}

/// Engine with the real image transforms and fixed names.
pub fn setup_image_engine(json: &str) -> (ImageStorageEngine, Arc<MemoryGateway>) {
    let gateway = Arc::new(MemoryGateway::new());
    let engine = ImageStorageEngine::builder(config(json), gateway.clone())
        .name_generator(Arc::new(FixedNames))
        .build();
    (engine, gateway)
}
