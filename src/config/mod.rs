//! Configuration loading for modpak

pub mod schema;

pub use schema::Config;

use crate::error::{BuildpackError, BuildpackResult};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Name of the per-application configuration file
pub const CONFIG_FILE: &str = "modpak.toml";

/// Load `modpak.toml` from the application root, falling back to defaults
/// when the file does not exist.
pub async fn load(app_dir: &Path) -> BuildpackResult<Config> {
    let path = app_dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!("No {} found, using defaults", CONFIG_FILE);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| BuildpackError::io(format!("reading config from {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| BuildpackError::ConfigInvalid {
        path,
        reason: e.to_string(),
    })
}
