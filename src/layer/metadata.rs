//! Persisted layer metadata records
//!
//! Each layer persists one TOML record next to its directory
//! (`<layers>/<name>.toml`) carrying the layer kind flags and the
//! fingerprint the contents were built from. The record is only ever
//! written after a successful population, via temp-file + rename, so a
//! crashed build can never leave a layer looking valid.

use crate::error::{BuildpackError, BuildpackResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// On-disk metadata record for one layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// Layer is part of the launch image
    pub launch: bool,
    /// Layer is available to later build phases
    pub build: bool,
    /// Layer is persisted as a build cache
    pub cache: bool,
    /// Content record
    pub metadata: ContentMetadata,
}

/// Content fingerprint and provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Fingerprint the layer contents were built from
    pub fingerprint: String,
    /// When the layer was last populated (RFC3339)
    pub created_at: DateTime<Utc>,
}

impl LayerMetadata {
    /// Create a fresh record for a just-populated layer
    pub fn new(launch: bool, build: bool, cache: bool, fingerprint: String) -> Self {
        Self {
            launch,
            build,
            cache,
            metadata: ContentMetadata {
                fingerprint,
                created_at: Utc::now(),
            },
        }
    }

    /// Read a record from disk.
    ///
    /// A missing file is a normal first build. An unreadable or unparsable
    /// record is treated the same way (the layer will be rebuilt), with a
    /// warning rather than a hard failure.
    pub async fn read(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(_) => return None,
        };

        match toml::from_str(&content) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(
                    "Ignoring invalid layer metadata at {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Write the record atomically (temp file + rename in the same directory).
    pub async fn write(&self, path: &Path) -> BuildpackResult<()> {
        let content = toml::to_string_pretty(self)?;

        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, &content)
            .await
            .map_err(|e| BuildpackError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| BuildpackError::io(format!("committing {}", path.display()), e))?;

        Ok(())
    }
}
