//! Fingerprinted layer engine
//!
//! A layer is a named directory under the platform-provided layers root,
//! plus a metadata record storing the fingerprint it was built from. On
//! every build a layer is either reused bit-for-bit (fingerprint match) or
//! wiped and repopulated by its contributor. Population is all-or-nothing:
//! the metadata record is written only after the contributor succeeds, so a
//! failed build leaves the layer looking uninitialized, never falsely valid.
//!
//! The same decision engine serves both the module cache layer and the app
//! binary layer; only the contributor differs.

pub mod env;
pub mod metadata;

pub use metadata::LayerMetadata;

use crate::error::{BuildpackError, BuildpackResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// What a layer is for, mapped to the metadata kind flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Persisted between builds as a download/build cache
    Cache,
    /// Part of the launch image
    Launch,
    /// Available to later build phases only
    Build,
}

impl LayerKind {
    /// (launch, build, cache) flags for the metadata record
    fn flags(self) -> (bool, bool, bool) {
        match self {
            Self::Cache => (false, true, true),
            Self::Launch => (true, false, false),
            Self::Build => (false, true, false),
        }
    }
}

/// Validity of a layer with respect to the current fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    /// No metadata record exists (first build, or a previous failure)
    Uninitialized,
    /// Recorded fingerprint matches the current one
    Valid,
    /// Recorded fingerprint differs; contents must be rebuilt
    Stale,
}

/// Outcome of the reuse/rebuild decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Contents left untouched, contributor not invoked
    Reuse,
    /// Contents wiped and repopulated
    Rebuild,
}

/// Produces a layer's contents on rebuild
#[async_trait]
pub trait LayerContributor {
    /// Populate the (already wiped) layer directory.
    async fn contribute(&self, layer: &Layer) -> BuildpackResult<()>;
}

/// A named, fingerprinted layer directory
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer name (directory and metadata file stem)
    pub name: String,
    /// Layer directory root
    pub path: PathBuf,
    /// Metadata record path (`<layers>/<name>.toml`)
    pub metadata_path: PathBuf,
    /// Layer kind
    pub kind: LayerKind,
}

impl Layer {
    /// Create a handle for a layer under the layers root. Touches nothing
    /// on disk.
    pub fn new(layers_dir: &Path, name: &str, kind: LayerKind) -> Self {
        Self {
            name: name.to_string(),
            path: layers_dir.join(name),
            metadata_path: layers_dir.join(format!("{name}.toml")),
            kind,
        }
    }

    /// The conventional executable directory inside the layer
    pub fn bin_dir(&self) -> PathBuf {
        self.path.join("bin")
    }

    /// Determine the layer's state for the current fingerprint.
    pub async fn state(&self, fingerprint: &str) -> LayerState {
        match LayerMetadata::read(&self.metadata_path).await {
            None => LayerState::Uninitialized,
            Some(metadata) if metadata.metadata.fingerprint == fingerprint => LayerState::Valid,
            Some(_) => LayerState::Stale,
        }
    }

    /// Wipe the layer directory and any stale metadata, leaving an empty
    /// directory ready for population.
    pub async fn reset(&self) -> BuildpackResult<()> {
        if self.path.exists() {
            fs::remove_dir_all(&self.path)
                .await
                .map_err(|e| BuildpackError::LayerReset {
                    name: self.name.clone(),
                    source: e,
                })?;
        }
        if self.metadata_path.exists() {
            fs::remove_file(&self.metadata_path)
                .await
                .map_err(|e| BuildpackError::LayerReset {
                    name: self.name.clone(),
                    source: e,
                })?;
        }
        fs::create_dir_all(&self.path)
            .await
            .map_err(|e| BuildpackError::LayerReset {
                name: self.name.clone(),
                source: e,
            })?;
        Ok(())
    }

    /// Record a successful population under `fingerprint`.
    pub async fn commit(&self, fingerprint: &str) -> BuildpackResult<()> {
        let (launch, build, cache) = self.kind.flags();
        LayerMetadata::new(launch, build, cache, fingerprint.to_string())
            .write(&self.metadata_path)
            .await
    }
}

/// Run the reuse/rebuild decision for a layer.
///
/// On a fingerprint match the contributor is never invoked and the layer is
/// untouched. Otherwise the layer is wiped, the contributor populates it,
/// and the fingerprint is committed only after the contributor succeeds.
pub async fn ensure(
    layer: &Layer,
    fingerprint: &str,
    contributor: &dyn LayerContributor,
) -> BuildpackResult<Decision> {
    match layer.state(fingerprint).await {
        LayerState::Valid => {
            debug!("Layer {} valid for {}, reusing", layer.name, fingerprint);
            Ok(Decision::Reuse)
        }
        state => {
            info!("Layer {} is {:?}, rebuilding", layer.name, state);
            layer.reset().await?;
            contributor.contribute(layer).await?;
            layer.commit(fingerprint).await?;
            Ok(Decision::Rebuild)
        }
    }
}
