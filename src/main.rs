//! CLI entry point for the harvester tool.

use std::io::{self, IsTerminal};
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::{MergeOutcome, Pipeline, PipelineConfig};
use tracing::{debug, info};

mod cli;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // RUST_LOG wins over the default level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = PipelineConfig::from_env(args.refresh()).context("Invalid configuration")?;
    info!(
        data_dir = %config.data_dir.display(),
        refresh = config.refresh,
        "Harvester starting"
    );

    let pipeline = Pipeline::new(config)?;

    let use_spinner =
        progress::should_use_spinner(io::stderr().is_terminal(), progress::is_dumb_terminal());
    let (progress_handle, progress_stop) = progress::spawn_progress_ui(
        use_spinner,
        vec![
            ("Probing domains", pipeline.probe_progress()),
            ("Downloading inventories", pipeline.download_progress()),
        ],
    );

    let outcome = pipeline.run().await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary = outcome.context("Harvest failed")?;

    match &summary.merge {
        MergeOutcome::AlreadyMerged => info!(
            json = %pipeline.layout().merged_json().display(),
            "Outputs already up to date; run with `refresh` to rebuild"
        ),
        MergeOutcome::Merged(report) => info!(
            records = report.records_written,
            json = %pipeline.layout().merged_json().display(),
            csv = %pipeline.layout().merged_csv().display(),
            "Merged inventory written"
        ),
    }

    Ok(())
}
