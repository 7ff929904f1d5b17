//! Integration tests for the task coordinator: dependency gating,
//! cascade abandonment, review convergence, cancellation, and isolation
//! between concurrent tasks.

use std::sync::Arc;

use conclave::adapters::memory::InMemoryTaskStore;
use conclave::adapters::mock::{
    Omniscient, PerTaskScriptedBackend, RevisionCounter, ScriptedOutcome, ScriptedReviewer,
};
use conclave::domain::errors::DomainError;
use conclave::domain::models::{
    BackendTier, ConvergenceResult, EngineConfig, Finding, Severity, Task, TaskStatus,
};
use conclave::domain::ports::Backend;
use conclave::services::{TaskCoordinator, TierCouncil};

fn council_of(backend: &Arc<PerTaskScriptedBackend>) -> TierCouncil {
    BackendTier::ALL
        .iter()
        .map(|tier| (*tier, Arc::clone(backend) as Arc<dyn Backend>))
        .collect()
}

fn coordinator_with(
    backend: &Arc<PerTaskScriptedBackend>,
    reviewer: ScriptedReviewer,
    config: EngineConfig,
) -> TaskCoordinator {
    TaskCoordinator::new(
        Arc::new(InMemoryTaskStore::new()),
        council_of(backend),
        Arc::new(reviewer),
        Arc::new(RevisionCounter::new()),
        Arc::new(Omniscient),
        config,
    )
}

#[tokio::test]
async fn dependent_task_runs_after_its_dependency_succeeds() {
    let backend = Arc::new(PerTaskScriptedBackend::new());
    let coordinator = coordinator_with(
        &backend,
        ScriptedReviewer::always_clean(),
        EngineConfig::default(),
    );

    let schema = Task::new("design the schema");
    let api = Task::new("build the API").with_dependency(schema.id);

    coordinator.submit_task(schema.clone()).await.unwrap();
    coordinator.submit_task(api.clone()).await.unwrap();

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.dispositions.len(), 2);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.abandoned(), 0);

    // A clean reviewer converges in exactly the required clean rounds.
    for disposition in &summary.dispositions {
        let report = disposition.convergence.as_ref().unwrap();
        assert_eq!(report.result, ConvergenceResult::Converged);
        assert_eq!(report.rounds_used(), 2);
    }
}

#[tokio::test]
async fn failed_dependency_cascades_to_abandonment() {
    let backend = Arc::new(PerTaskScriptedBackend::new());
    let coordinator = coordinator_with(
        &backend,
        ScriptedReviewer::always_clean(),
        EngineConfig::default(),
    );

    let doomed = Task::new("a task that exhausts every tier");
    let dependent = Task::new("blocked forever").with_dependency(doomed.id);
    let transitive = Task::new("blocked transitively").with_dependency(dependent.id);

    backend
        .script_task(doomed.id, vec![ScriptedOutcome::fail(10, "verification")])
        .await;

    coordinator.submit_task(doomed.clone()).await.unwrap();
    coordinator.submit_task(dependent.clone()).await.unwrap();
    coordinator.submit_task(transitive.clone()).await.unwrap();

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.abandoned(), 3);

    let by_id = |id| {
        summary
            .dispositions
            .iter()
            .find(|d| d.task_id == id)
            .unwrap()
    };
    assert_eq!(by_id(doomed.id).abandon_reason.as_deref(), Some("exhausted"));
    assert_eq!(
        by_id(dependent.id).abandon_reason.as_deref(),
        Some("dependency_failed")
    );
    assert_eq!(
        by_id(transitive.id).abandon_reason.as_deref(),
        Some("dependency_failed")
    );
    // Cascaded tasks never reached a backend.
    assert!(by_id(dependent.id).attempts.is_empty());
}

#[tokio::test]
async fn unknown_dependency_is_rejected_at_submission() {
    let backend = Arc::new(PerTaskScriptedBackend::new());
    let coordinator = coordinator_with(
        &backend,
        ScriptedReviewer::always_clean(),
        EngineConfig::default(),
    );

    let phantom = Task::new("never submitted");
    let task = Task::new("depends on a phantom").with_dependency(phantom.id);

    let err = coordinator.submit_task(task).await.unwrap_err();
    assert!(matches!(err, DomainError::MissingDependency { .. }));
}

#[tokio::test]
async fn cancel_is_idempotent_and_skips_the_task() {
    let backend = Arc::new(PerTaskScriptedBackend::new());
    let coordinator = coordinator_with(
        &backend,
        ScriptedReviewer::always_clean(),
        EngineConfig::default(),
    );

    let task = Task::new("cancelled before the run");
    coordinator.submit_task(task.clone()).await.unwrap();

    coordinator.cancel(task.id).await.unwrap();
    // Second cancellation is a no-op, not an error.
    coordinator.cancel(task.id).await.unwrap();

    let report = coordinator.status(task.id).await.unwrap();
    assert_eq!(report.state, TaskStatus::Abandoned);

    let summary = coordinator.run().await.unwrap();
    assert!(summary.dispositions.is_empty());
}

#[tokio::test]
async fn second_run_does_not_replay_earlier_dispositions() {
    let backend = Arc::new(PerTaskScriptedBackend::new());
    let coordinator = coordinator_with(
        &backend,
        ScriptedReviewer::always_clean(),
        EngineConfig::default(),
    );

    let task = Task::new("runs exactly once");
    coordinator.submit_task(task.clone()).await.unwrap();

    let first = coordinator.run().await.unwrap();
    assert_eq!(first.dispositions.len(), 1);

    // The backlog is drained; a second run reports nothing.
    let second = coordinator.run().await.unwrap();
    assert!(second.dispositions.is_empty());

    // Earlier results still back status queries.
    let report = coordinator.status(task.id).await.unwrap();
    assert_eq!(report.state, TaskStatus::Succeeded);
    assert!(report.last_attempt.is_some());
}

#[tokio::test]
async fn review_findings_delay_convergence_until_clean_rounds() {
    let backend = Arc::new(PerTaskScriptedBackend::new());
    // Round 1 has a blocker; rounds 2 and 3 are the qualifying clean pair.
    let reviewer = ScriptedReviewer::new(vec![
        vec![Finding::new(
            Severity::Blocker,
            "correctness",
            "api contract violated",
        )],
        Vec::new(),
        Vec::new(),
    ]);
    let coordinator = coordinator_with(&backend, reviewer, EngineConfig::default());

    let task = Task::new("work that needs one revision");
    coordinator.submit_task(task.clone()).await.unwrap();

    let summary = coordinator.run().await.unwrap();
    let report = summary.dispositions[0].convergence.as_ref().unwrap();
    assert_eq!(report.result, ConvergenceResult::Converged);
    assert_eq!(report.rounds_used(), 3);
}

#[tokio::test]
async fn concurrent_tasks_keep_isolated_ledgers() {
    let backend = Arc::new(PerTaskScriptedBackend::new());
    let mut config = EngineConfig::default();
    config.runtime.max_concurrent_tasks = 4;
    let coordinator = coordinator_with(&backend, ScriptedReviewer::always_clean(), config);

    let quick = Task::new("passes first try");
    let climber = Task::new("escalates once");
    let asker = Task::new("needs context first");
    let doomed = Task::new("fails everywhere");

    backend
        .script_task(
            climber.id,
            vec![
                ScriptedOutcome::fail(40, "verification"),
                ScriptedOutcome::fail(30, "verification"),
                ScriptedOutcome::pass(85),
            ],
        )
        .await;
    backend
        .script_task(
            asker.id,
            vec![
                ScriptedOutcome::fail_with_questions(50, &["which endpoint?"]),
                ScriptedOutcome::pass(90),
            ],
        )
        .await;
    backend
        .script_task(doomed.id, vec![ScriptedOutcome::fail(10, "verification")])
        .await;

    for task in [&quick, &climber, &asker, &doomed] {
        coordinator.submit_task(task.clone()).await.unwrap();
    }

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.abandoned(), 1);

    let by_id = |id| {
        summary
            .dispositions
            .iter()
            .find(|d| d.task_id == id)
            .unwrap()
    };
    assert_eq!(by_id(quick.id).attempts.len(), 1);
    assert_eq!(by_id(climber.id).attempts.len(), 3);
    assert_eq!(
        by_id(climber.id).final_tier,
        Some(BackendTier::WideContextAnalyst)
    );
    assert_eq!(by_id(asker.id).attempts.len(), 2);
    assert_eq!(by_id(doomed.id).attempts.len(), 6);

    // Every ledger is per task: sequences restart at 1 and step by 1.
    for disposition in &summary.dispositions {
        for (idx, attempt) in disposition.attempts.iter().enumerate() {
            assert_eq!(attempt.sequence, idx as u64 + 1);
            assert_eq!(attempt.task_id, disposition.task_id);
        }
    }
}
