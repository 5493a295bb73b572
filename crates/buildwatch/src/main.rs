//! Buildwatch CLI - watch build-distribution endpoints, publish snapshots.
//!
//! This is the main entry point for the buildwatch daemon.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use buildwatch::cli::Cli;
use buildwatch::pipeline::Pipeline;
use buildwatch_core::{Layout, WatchConfig};
use buildwatch_source::SourceMonitor;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = WatchConfig::load(cli.config.as_deref())?;
    let monitor = SourceMonitor::new(&config.network)?;
    let pipeline = Pipeline::from_config(&config)?;

    info!(
        environments = config.environments.len(),
        interval = config.poll_interval_secs,
        "starting"
    );

    loop {
        clear_temp(pipeline.layout());
        pipeline.run_pass(&monitor, &config).await;

        if cli.once {
            break;
        }
        info!(seconds = config.poll_interval_secs, "pass complete, sleeping");
        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
    }

    Ok(())
}

/// Wipe the scratch root so nothing leaks between passes. Non-fatal: the
/// per-pair directories are reset again before use.
fn clear_temp(layout: &Layout) {
    let root = layout.temp_root();
    if root.exists() {
        if let Err(e) = std::fs::remove_dir_all(root) {
            warn!(path = %root.display(), error = %e, "could not clear temp root");
        }
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
