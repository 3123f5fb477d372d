//! Error types for modpak
//!
//! All modules use `BuildpackResult<T>` as their return type. Every variant
//! is terminal for the current build; nothing here is retried internally.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for buildpack operations
pub type BuildpackResult<T> = Result<T, BuildpackError>;

/// All errors that can occur during detection or build
#[derive(Error, Debug)]
pub enum BuildpackError {
    // Detection errors
    #[error("No Go module found: expected go.mod at {0}")]
    DetectFailed(PathBuf),

    #[error("Build target not found: {path} is not a directory inside the application")]
    TargetInvalid { path: PathBuf },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Layer errors
    #[error("Invalid layer metadata at {path}: {reason}")]
    LayerMetadataInvalid { path: PathBuf, reason: String },

    #[error("Failed to reset layer {name}: {source}")]
    LayerReset {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // Toolchain errors
    #[error("Module download failed: {0}")]
    FetchFailed(String),

    #[error("`go install` failed to install executable(s) in {}", expected.display())]
    IncompleteExecutable { expected: PathBuf },

    #[error("Compilation failed: {stderr}")]
    CompileFailed { stderr: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl BuildpackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }
}
