//! modpak - Cloud Native Buildpack for Go modules
//!
//! CLI entry point that dispatches to the detect and build phases.

use clap::Parser;
use console::style;
use modpak::cli::{Cli, Commands};
use modpak::error::BuildpackResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BuildpackResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("modpak=warn"),
        1 => EnvFilter::new("modpak=info"),
        _ => EnvFilter::new("modpak=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Detect(args) => modpak::cli::commands::detect(args).await,
        Commands::Build(args) => modpak::cli::commands::build(args).await,
    }
}
