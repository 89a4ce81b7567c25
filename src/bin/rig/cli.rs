//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Rig - publish a package's build artifacts from its Rigging.toml
#[derive(Parser)]
#[command(name = "rig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Package directory to publish
    #[arg(long, default_value = ".")]
    pub package: PathBuf,

    /// Suppress all output except errors
    #[arg(long, conflicts_with = "debug")]
    pub silent: bool,

    /// Enable debug output and full error cause chains
    #[arg(long)]
    pub debug: bool,
}
