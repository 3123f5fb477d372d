//! Content fingerprints for layer reuse decisions
//!
//! Two independent fingerprints drive the cache engine:
//!
//! - the dependency fingerprint, over `go.mod` + `go.sum` contents only, keys
//!   the module cache layer;
//! - the source fingerprint, over the whole application tree plus the build
//!   plan, keys the app binary layer.
//!
//! Both are pure content hashes: no timestamps, permissions, or absolute
//! paths, so identical inputs hash identically across machines and runs.

use crate::error::{BuildpackError, BuildpackResult};
use crate::plan::{BuildPlan, LOCK_FILE, MANIFEST};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Fingerprint length in hex characters (6 bytes of SHA-256)
const FINGERPRINT_LEN: usize = 12;

fn finish(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_LEN / 2])
}

/// Fingerprint of the dependency manifest and lock file.
///
/// Unrelated source changes never affect this value; byte-identical
/// manifests always produce the same fingerprint.
pub fn dependency(module_root: &Path) -> BuildpackResult<String> {
    let mut hasher = Sha256::new();

    let manifest = module_root.join(MANIFEST);
    let contents = fs::read(&manifest)
        .map_err(|e| BuildpackError::io(format!("reading {}", manifest.display()), e))?;
    hasher.update(&contents);

    let lock = module_root.join(LOCK_FILE);
    if lock.is_file() {
        let contents = fs::read(&lock)
            .map_err(|e| BuildpackError::io(format!("reading {}", lock.display()), e))?;
        hasher.update(&contents);
    }

    let fingerprint = finish(hasher);
    debug!("Dependency fingerprint: {}", fingerprint);
    Ok(fingerprint)
}

/// Fingerprint of the application source tree and build plan.
///
/// Walks the tree in sorted order, hashing each file's relative path and
/// contents, then folds in the plan fields (target, ldflags in order,
/// vendored flag). The manifests live inside the tree, so a dependency
/// change always invalidates the binary as well.
pub fn source(app_dir: &Path, plan: &BuildPlan) -> BuildpackResult<String> {
    let mut hasher = Sha256::new();
    hash_tree(&mut hasher, app_dir, app_dir)?;

    if let Some(target) = &plan.target {
        hasher.update(b"target\0");
        hasher.update(target.to_string_lossy().as_bytes());
        hasher.update([0]);
    }
    for flag in &plan.ldflags {
        hasher.update(b"ldflag\0");
        hasher.update(flag.as_bytes());
        hasher.update([0]);
    }
    if plan.vendored {
        hasher.update(b"vendored\0");
    }

    let fingerprint = finish(hasher);
    debug!("Source fingerprint: {}", fingerprint);
    Ok(fingerprint)
}

/// Hash every regular file under `dir`, sorted by path for determinism.
fn hash_tree(hasher: &mut Sha256, root: &Path, dir: &Path) -> BuildpackResult<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| BuildpackError::io(format!("listing {}", dir.display()), e))?
        .collect::<Result<_, _>>()
        .map_err(|e| BuildpackError::io(format!("listing {}", dir.display()), e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            hash_tree(hasher, root, &path)?;
        } else if path.is_file() {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            hasher.update(rel.to_string_lossy().as_bytes());
            hasher.update([0]);
            let contents = fs::read(&path)
                .map_err(|e| BuildpackError::io(format!("reading {}", path.display()), e))?;
            hasher.update(&contents);
            hasher.update([0]);
        }
    }
    Ok(())
}
