//! Detect command - decide applicability and print the resolved plan

use crate::cli::args::DetectArgs;
use crate::error::BuildpackResult;
use crate::{config, plan};
use console::style;

/// Execute the detect phase. Exits non-zero (via the propagated error) when
/// no Go module is resolvable.
pub async fn execute(args: DetectArgs) -> BuildpackResult<()> {
    let config = config::load(&args.app_dir).await?;
    let plan = plan::resolve(&args.app_dir, &config)?;

    println!("{} Go module detected", style("✓").green());
    if let Some(target) = &plan.target {
        println!("  target:   {}", target.display());
    }
    if !plan.ldflags.is_empty() {
        println!("  ldflags:  {}", plan.ldflags.join(" "));
    }
    println!("  vendored: {}", plan.vendored);

    Ok(())
}
