//! Detection and build-plan resolution
//!
//! Decides whether the buildpack applies to an application tree and what the
//! single build invocation will compile: which module root, which linker
//! flags, and whether dependencies are vendored.

use crate::config::Config;
use crate::error::{BuildpackError, BuildpackResult};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Dependency manifest that marks a Go module root
pub const MANIFEST: &str = "go.mod";

/// Lock file recording resolved module checksums
pub const LOCK_FILE: &str = "go.sum";

/// Directory that, when present, bundles all dependencies in-tree
pub const VENDOR_DIR: &str = "vendor";

/// Resolved, immutable description of one build invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Sub-path of the application containing the module to compile.
    /// `None` means the application root.
    pub target: Option<PathBuf>,

    /// Linker flags, verbatim and order-preserved
    pub ldflags: Vec<String>,

    /// Whether dependencies are vendored in-tree (suppresses all fetches)
    pub vendored: bool,
}

impl BuildPlan {
    /// Absolute path of the module root for this plan
    pub fn module_root(&self, app_dir: &Path) -> PathBuf {
        match &self.target {
            Some(target) => app_dir.join(target),
            None => app_dir.to_path_buf(),
        }
    }
}

/// Resolve the build plan for an application, or fail with a detection error.
///
/// The buildpack applies when `go.mod` exists at the module root (the app
/// root, or the configured target sub-path). A `vendor/` directory under the
/// module root forces vendored mode.
pub fn resolve(app_dir: &Path, config: &Config) -> BuildpackResult<BuildPlan> {
    let target = match &config.build.target {
        Some(raw) => Some(validate_target(app_dir, raw)?),
        None => None,
    };

    let module_root = match &target {
        Some(t) => app_dir.join(t),
        None => app_dir.to_path_buf(),
    };

    let manifest = module_root.join(MANIFEST);
    if !manifest.is_file() {
        return Err(BuildpackError::DetectFailed(manifest));
    }

    let vendored = module_root.join(VENDOR_DIR).is_dir();
    debug!(
        "Resolved plan: target={:?} vendored={} ldflags={:?}",
        target, vendored, config.build.ldflags
    );

    Ok(BuildPlan {
        target,
        ldflags: config.build.ldflags.clone(),
        vendored,
    })
}

/// Validate that a configured target is a plain relative sub-path that
/// exists inside the application.
fn validate_target(app_dir: &Path, raw: &str) -> BuildpackResult<PathBuf> {
    let path = PathBuf::from(raw);

    let traversal = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if traversal {
        return Err(BuildpackError::TargetInvalid { path });
    }

    if !app_dir.join(&path).is_dir() {
        return Err(BuildpackError::TargetInvalid { path });
    }

    Ok(path)
}
