//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// modpak - Cloud Native Buildpack for Go modules
///
/// Detects Go-module applications, caches dependency downloads in a
/// fingerprinted cache layer, and compiles the app into a launch layer.
#[derive(Parser, Debug)]
#[command(name = "modpak")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the buildpack applies and print the resolved plan
    Detect(DetectArgs),

    /// Run the full build pipeline
    Build(BuildArgs),
}

/// Arguments for the detect phase
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Application root directory
    pub app_dir: PathBuf,
}

/// Arguments for the build phase
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Application root directory
    pub app_dir: PathBuf,

    /// Directory holding layer directories and metadata records
    #[arg(short, long, env = "CNB_LAYERS_DIR")]
    pub layers: PathBuf,
}
