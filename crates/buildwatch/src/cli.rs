//! CLI argument parsing with clap

use clap::Parser;
use std::path::PathBuf;

/// Buildwatch - watch a game's distribution endpoints and publish snapshots
#[derive(Parser, Debug)]
#[command(name = "buildwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to buildwatch.yaml config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run a single pass over all environments and exit
    #[arg(long)]
    pub once: bool,
}
