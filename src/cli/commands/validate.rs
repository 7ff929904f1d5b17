//! Validate a backlog file without executing it.

use anyhow::{bail, Result};
use serde_json::json;

use crate::cli::backlog;
use crate::cli::ValidateArgs;
use crate::services::DependencyResolver;

pub async fn execute(args: ValidateArgs, json: bool) -> Result<()> {
    let resolved = backlog::load(&args.backlog)?;

    let resolver = DependencyResolver::new();
    if let Some(cycle) = resolver.detect_cycle(&resolved.tasks) {
        bail!("backlog contains a dependency cycle: {cycle:?}");
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "valid": true,
                "tasks": resolved.tasks.len(),
            }))?
        );
    } else {
        println!(
            "backlog ok: {} task(s), no dependency cycles",
            resolved.tasks.len()
        );
    }
    Ok(())
}
