//! Execute a backlog file against a scripted council.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::memory::InMemoryTaskStore;
use crate::adapters::mock::{
    Omniscient, PerTaskScriptedBackend, RevisionCounter, ScriptedReviewer,
};
use crate::cli::backlog;
use crate::cli::display;
use crate::cli::RunArgs;
use crate::domain::models::BackendTier;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{TaskCoordinator, TierCouncil};

pub async fn execute(args: RunArgs, json: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let resolved = backlog::load(&args.backlog)?;

    let backend = Arc::new(PerTaskScriptedBackend::new());
    for (task_id, script) in &resolved.scripts {
        backend.script_task(*task_id, script.clone()).await;
    }

    let reviewer = if resolved.review_script.is_empty() {
        ScriptedReviewer::always_clean()
    } else {
        ScriptedReviewer::new(resolved.review_script.clone())
    };

    let council: TierCouncil = BackendTier::ALL
        .iter()
        .map(|tier| (*tier, Arc::clone(&backend) as _))
        .collect();

    let coordinator = TaskCoordinator::new(
        Arc::new(InMemoryTaskStore::new()),
        council,
        Arc::new(reviewer),
        Arc::new(RevisionCounter::new()),
        Arc::new(Omniscient),
        config,
    );

    for task in resolved.tasks {
        coordinator
            .submit_task(task)
            .await
            .context("task submission failed")?;
    }

    let summary = coordinator.run().await.context("backlog run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", display::render_summary(&summary));
    }

    if summary.abandoned() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
