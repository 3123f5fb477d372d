//! Build command - the sequential build pipeline
//!
//! Plan resolution, dependency fingerprinting, module cache layer, compile,
//! app binary layer. One build, no internal parallelism or retries: every
//! failure is terminal and leaves no layer falsely valid.

use crate::cli::args::BuildArgs;
use crate::error::{BuildpackError, BuildpackResult};
use crate::layer::{self, env, Decision, Layer, LayerContributor, LayerKind};
use crate::plan::BuildPlan;
use crate::toolchain::GoTool;
use crate::{config, fingerprint, plan};
use async_trait::async_trait;
use console::style;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Buildpack identifier used in log lines
const BUILDPACK_ID: &str = "modpak";

/// Name of the module cache layer
const CACHE_LAYER: &str = "go-cache";

/// Name of the launch layer holding the compiled executable
const BINARY_LAYER: &str = "app-binary";

/// Subdirectory of the cache layer handed to the toolchain as module cache
const MODCACHE_DIR: &str = "mod";

/// Execute the build phase.
pub async fn execute(args: BuildArgs) -> BuildpackResult<()> {
    let app_dir = canonicalize(&args.app_dir).await?;

    fs::create_dir_all(&args.layers)
        .await
        .map_err(|e| BuildpackError::io(format!("creating {}", args.layers.display()), e))?;
    // GOBIN and GOMODCACHE must be absolute
    let layers_dir = canonicalize(&args.layers).await?;

    let config = config::load(&app_dir).await?;
    let plan = plan::resolve(&app_dir, &config)?;
    let module_root = plan.module_root(&app_dir);
    let tool = GoTool::new(&module_root);

    // Module cache layer, keyed on the dependency manifest only
    let modcache = resolve_module_cache(&layers_dir, &module_root, &plan, &tool).await?;

    // App binary layer, keyed on source tree + plan
    let src_fingerprint = fingerprint::source(&app_dir, &plan)?;
    let binary_layer = Layer::new(&layers_dir, BINARY_LAYER, LayerKind::Launch);
    let contributor = AppBinaryContributor {
        tool: &tool,
        plan: &plan,
        modcache: modcache.as_deref(),
    };
    match layer::ensure(&binary_layer, &src_fingerprint, &contributor).await? {
        Decision::Reuse => {
            println!("Reusing layer '{BUILDPACK_ID}:{BINARY_LAYER}'");
        }
        Decision::Rebuild => {}
    }

    println!("{} Build complete", style("✓").green());
    Ok(())
}

/// Run the module cache layer decision and return the module cache path the
/// compile should use, if any.
///
/// Vendored apps bypass the cache entirely: the vendor directory is
/// authoritative, no fetch runs, and any existing cache contents are left
/// untouched and unused.
async fn resolve_module_cache(
    layers_dir: &Path,
    module_root: &Path,
    plan: &BuildPlan,
    tool: &GoTool,
) -> BuildpackResult<Option<PathBuf>> {
    if plan.vendored {
        println!("Using vendored dependencies");
        return Ok(None);
    }

    let dep_fingerprint = fingerprint::dependency(module_root)?;
    let cache_layer = Layer::new(layers_dir, CACHE_LAYER, LayerKind::Cache);
    let contributor = ModCacheContributor { tool };

    match layer::ensure(&cache_layer, &dep_fingerprint, &contributor).await? {
        Decision::Reuse => {
            // Stable substring: tooling greps for this reuse notice
            println!("Adding cache layer '{BUILDPACK_ID}:{CACHE_LAYER}'");
        }
        Decision::Rebuild => {}
    }

    Ok(Some(cache_layer.path.join(MODCACHE_DIR)))
}

/// Populates the module cache layer by fetching dependencies
struct ModCacheContributor<'a> {
    tool: &'a GoTool,
}

#[async_trait]
impl LayerContributor for ModCacheContributor<'_> {
    async fn contribute(&self, layer: &Layer) -> BuildpackResult<()> {
        println!("Downloading Go modules");
        self.tool.mod_download(&layer.path.join(MODCACHE_DIR)).await
    }
}

/// Populates the app binary layer by compiling the module
struct AppBinaryContributor<'a> {
    tool: &'a GoTool,
    plan: &'a BuildPlan,
    modcache: Option<&'a Path>,
}

#[async_trait]
impl LayerContributor for AppBinaryContributor<'_> {
    async fn contribute(&self, layer: &Layer) -> BuildpackResult<()> {
        println!("Compiling application");

        let bin_dir = layer.bin_dir();
        fs::create_dir_all(&bin_dir)
            .await
            .map_err(|e| BuildpackError::io(format!("creating {}", bin_dir.display()), e))?;

        let executable = self.tool.install(self.plan, &bin_dir, self.modcache).await?;
        debug!("Installed executable: {}", executable.display());
        println!("Contributed executable {}", executable.display());

        env::prepend_launch(layer, "PATH", &bin_dir.to_string_lossy()).await
    }
}

async fn canonicalize(path: &Path) -> BuildpackResult<PathBuf> {
    fs::canonicalize(path)
        .await
        .map_err(|e| BuildpackError::io(format!("resolving {}", path.display()), e))
}
