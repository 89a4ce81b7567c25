//! Rig CLI - package publisher for Rigging workspaces

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

use rigging::core::workspace::CONFIG_FILE_NAME;
use rigging::core::{load_config, Generation, PackageMetadata};
use rigging::publisher::{publish, PublishOptions};

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.silent {
        EnvFilter::new("rigging=error")
    } else if cli.debug {
        EnvFilter::new("rigging=debug")
    } else {
        EnvFilter::new("rigging=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        if cli.debug {
            // Full cause chain
            eprintln!("error: {e:?}");
        } else {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let directory = cli
        .package
        .canonicalize()
        .with_context(|| format!("package directory not found: {}", cli.package.display()))?;

    let name = package_name(&directory);
    // The config error is the top-level message: validation failures carry
    // every offending key and must not be hidden behind a wrapper.
    let config = load_config(&directory.join(CONFIG_FILE_NAME), Generation::default())?;

    let metadata = PackageMetadata::from_config(name, directory, &config);
    publish(&metadata, &PublishOptions::default())?;

    Ok(())
}

fn package_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package".to_string())
}
