//! Stowage CLI: store local images through the storage engine.
//!
//! Storage backend from STORAGE_BACKEND (s3 or local) plus S3_* / LOCAL_STORAGE_* settings;
//! engine options from an optional JSON file with S3_BUCKET, S3_PATH and CDN_HOST fallbacks.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use stowage_core::stream::from_reader;
use stowage_core::GatewayConfig;
use stowage_engine::{ImageStorageEngine, IncomingFile, Removal, StorageEngine};
use stowage_storage::create_gateway;

use stowage_cli::{init_tracing, load_config, original_name};

#[derive(Parser)]
#[command(name = "stowage", about = "Store image variants on S3 or the local filesystem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store every configured variant of a local image
    Upload {
        /// Path to the image
        file: PathBuf,
        /// JSON engine options
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Print the variants an upload would produce
    Plan {
        /// JSON engine options
        #[arg(long)]
        options: Option<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { options } => {
            let config = load_config(options.as_deref())?;
            print_json(&stowage_engine::planner::expand(&config))?;
        }
        Commands::Upload { file, options } => {
            let config = load_config(options.as_deref())?;
            let gateway_config = GatewayConfig::from_env().context("Invalid gateway settings")?;
            let gateway = create_gateway(&gateway_config)
                .await
                .context("Failed to create storage gateway")?;
            let engine = ImageStorageEngine::builder(config, gateway).build();

            let name = original_name(&file);
            let source = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;

            match engine
                .handle_file(IncomingFile::new(name.clone(), from_reader(source)))
                .await
            {
                Ok(stored) => print_json(&stored)?,
                Err(err) => {
                    match engine.remove_file(&name).await {
                        Ok(Removal::NothingToCompensate) => {}
                        Ok(removal) => tracing::info!(
                            deleted = removal.deleted_keys().len(),
                            "Removed partial upload"
                        ),
                        Err(e) => tracing::error!(error = %e, "Failed to remove partial upload"),
                    }
                    return Err(err).context(format!("Upload of {} failed", file.display()));
                }
            }
        }
    }

    Ok(())
}
