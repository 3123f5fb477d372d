//! Layer environment contributions
//!
//! Launch-time environment is contributed through per-layer files the
//! lifecycle applies when starting the app: `env.launch/<VAR>.prepend`
//! holds the value, `<VAR>.delim` the list separator.

use crate::error::{BuildpackError, BuildpackResult};
use crate::layer::Layer;
use tokio::fs;
use tracing::debug;

/// Directory under a layer holding launch env contributions
pub const ENV_LAUNCH_DIR: &str = "env.launch";

/// Prepend `value` to the environment variable `var` at launch.
pub async fn prepend_launch(layer: &Layer, var: &str, value: &str) -> BuildpackResult<()> {
    let env_dir = layer.path.join(ENV_LAUNCH_DIR);
    fs::create_dir_all(&env_dir)
        .await
        .map_err(|e| BuildpackError::io(format!("creating {}", env_dir.display()), e))?;

    let prepend = env_dir.join(format!("{var}.prepend"));
    fs::write(&prepend, value)
        .await
        .map_err(|e| BuildpackError::io(format!("writing {}", prepend.display()), e))?;

    let delim = env_dir.join(format!("{var}.delim"));
    fs::write(&delim, ":")
        .await
        .map_err(|e| BuildpackError::io(format!("writing {}", delim.display()), e))?;

    debug!("Layer {} prepends {}={}", layer.name, var, value);
    Ok(())
}
