//! Go toolchain invocation
//!
//! Wraps the external `go` binary for the two phases the buildpack needs:
//! the dependency fetch (`go mod download`) that populates the module cache
//! layer, and the compile (`go install`) that produces the app executable.
//! Both block until the process exits; the exit code is the sole
//! success/failure signal.

use crate::error::{BuildpackError, BuildpackResult};
use crate::plan::BuildPlan;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Handle on the external `go` binary, rooted at one module
pub struct GoTool {
    module_root: PathBuf,
}

impl GoTool {
    /// Create a tool handle for the given module root
    pub fn new(module_root: impl Into<PathBuf>) -> Self {
        Self {
            module_root: module_root.into(),
        }
    }

    /// Fetch all module dependencies into `modcache`.
    ///
    /// Stdout and stderr are inherited so the toolchain's discovery,
    /// download, and extraction progress streams straight into the build
    /// log. Those lines are part of the observable contract: they only ever
    /// appear when this fetch phase actually runs.
    pub async fn mod_download(&self, modcache: &Path) -> BuildpackResult<()> {
        debug!("Executing: go mod download (cwd {})", self.module_root.display());

        let status = Command::new("go")
            .args(["mod", "download"])
            .current_dir(&self.module_root)
            .env("GO111MODULE", "on")
            .env("GOMODCACHE", modcache)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| BuildpackError::command_failed("go mod download", e))?;

        if !status.success() {
            return Err(BuildpackError::FetchFailed(format!(
                "go mod download exited with {status}"
            )));
        }
        Ok(())
    }

    /// Compile the module into exactly one executable under `bin_dir`.
    ///
    /// Linker flags pass through unmodified and in order. Returns the
    /// absolute path of the produced executable; a clean exit that installs
    /// nothing (a library target with no `main` package) is reported as an
    /// error naming the expected install directory.
    pub async fn install(
        &self,
        plan: &BuildPlan,
        bin_dir: &Path,
        modcache: Option<&Path>,
    ) -> BuildpackResult<PathBuf> {
        let args = install_args(plan);
        debug!("Executing: go {:?} (cwd {})", args, self.module_root.display());

        let mut cmd = Command::new("go");
        cmd.args(&args)
            .current_dir(&self.module_root)
            .env("GO111MODULE", "on")
            .env("GOBIN", bin_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        if let Some(modcache) = modcache {
            cmd.env("GOMODCACHE", modcache);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| BuildpackError::command_failed("go install", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildpackError::CompileFailed {
                stderr: stderr.trim().to_string(),
            });
        }

        find_executable(bin_dir)?.ok_or_else(|| BuildpackError::IncompleteExecutable {
            expected: bin_dir.to_path_buf(),
        })
    }
}

/// Argument vector for the compile invocation
fn install_args(plan: &BuildPlan) -> Vec<String> {
    let mut args = vec!["install".to_string()];
    if plan.vendored {
        args.push("-mod=vendor".to_string());
    }
    if !plan.ldflags.is_empty() {
        args.push("-ldflags".to_string());
        args.push(plan.ldflags.join(" "));
    }
    args.push(".".to_string());
    args
}

/// First regular file in `bin_dir`, sorted by name for determinism.
fn find_executable(bin_dir: &Path) -> BuildpackResult<Option<PathBuf>> {
    let entries = match std::fs::read_dir(bin_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(BuildpackError::io(
                format!("listing {}", bin_dir.display()),
                e,
            ))
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    Ok(files.into_iter().next())
}
