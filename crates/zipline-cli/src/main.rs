#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;

use std::process;

use anyhow::Context;
use zipline_pipeline::Pipeline;
use zipline_store::StorageBackend;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "zipline_cli::startup";
pub const TRACING_TARGET_RUN: &str = "zipline_cli::run";
pub const TRACING_TARGET_CONFIG: &str = "zipline_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_RUN,
            "Run terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_RUN,
            error = %error,
            "Run terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    log_startup_info(&cli);
    cli.log_config();

    let storage_config = cli.storage.to_storage_config()?;
    let store =
        StorageBackend::new(storage_config).context("failed to initialize storage backend")?;
    let pipeline =
        Pipeline::new(store, cli.pipeline.clone()).context("invalid pipeline configuration")?;

    let report = pipeline.run().await.context("pipeline run failed")?;

    tracing::info!(
        target: TRACING_TARGET_RUN,
        candidates = report.candidate_count,
        relocated = report.relocated.len(),
        message = %report.message,
        "Run finished"
    );

    let rendered = serde_json::to_string_pretty(&report).context("failed to render run report")?;
    println!("{rendered}");

    Ok(())
}

/// Logs startup information.
fn log_startup_info(cli: &Cli) {
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        trigger = cli.trigger.as_deref().unwrap_or("<none>"),
        "Starting zipline run"
    );
}
