//! Configuration schema for modpak
//!
//! Configuration lives in an optional `modpak.toml` at the application root.
//! Everything in it is advisory input to plan resolution; a missing file
//! means defaults.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,
}

/// Build settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Sub-path of the application containing the module to compile
    /// (e.g. "cmd/web"). Defaults to the application root.
    pub target: Option<String>,

    /// Linker flags passed verbatim, order-preserved, to the compiler
    pub ldflags: Vec<String>,
}
