//! Task coordinator: the top-level driver.
//!
//! Sequences tasks from the backlog, enforces isolation between tasks
//! (fresh router and ledger partition per task), runs the convergence loop
//! over reviewable artifacts, and aggregates final dispositions.
//!
//! # Concurrency design
//!
//! Independent ready tasks run as concurrent, isolated units on a tokio
//! `JoinSet`, bounded by `max_concurrent_tasks`. The backlog is the only
//! shared mutable resource; claiming is delegated to the store's atomic
//! claim-or-skip, so two runners never dispatch the same task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Attempt, BackendTier, EngineConfig, Task, TaskStatus,
};
use crate::domain::ports::{EvidenceSearch, Reviewer, Reviser, TaskStore};
use crate::services::context_gatherer::ContextGatherer;
use crate::services::convergence::ConvergenceLoop;
use crate::services::council_router::{CouncilRouter, TaskDisposition, TierCouncil};
use crate::services::dependency_resolver::DependencyResolver;

/// Point-in-time view of one task, for `status` queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub task_id: Uuid,
    pub state: TaskStatus,
    /// Last recorded attempt, once the task is terminal.
    pub last_attempt: Option<Attempt>,
    /// Tier of the last attempt, once the task is terminal.
    pub escalation_tier: Option<BackendTier>,
}

/// Aggregated result of draining the backlog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub dispositions: Vec<TaskDisposition>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Succeeded)
    }

    pub fn abandoned(&self) -> usize {
        self.count(TaskStatus::Abandoned)
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.dispositions
            .iter()
            .filter(|d| d.status == status)
            .count()
    }
}

/// Top-level driver over the backlog and the backend council.
pub struct TaskCoordinator {
    store: Arc<dyn TaskStore>,
    council: TierCouncil,
    reviewer: Arc<dyn Reviewer>,
    reviser: Arc<dyn Reviser>,
    evidence: Arc<dyn EvidenceSearch>,
    config: EngineConfig,
    dependency_resolver: DependencyResolver,
    results: Arc<Mutex<HashMap<Uuid, TaskDisposition>>>,
}

impl TaskCoordinator {
    pub fn new(
        store: Arc<dyn TaskStore>,
        council: TierCouncil,
        reviewer: Arc<dyn Reviewer>,
        reviser: Arc<dyn Reviser>,
        evidence: Arc<dyn EvidenceSearch>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            council,
            reviewer,
            reviser,
            evidence,
            config,
            dependency_resolver: DependencyResolver::new(),
            results: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Submit a task to the backlog.
    ///
    /// Validates the task itself, that its dependencies exist, and that
    /// adding it introduces no dependency cycle.
    #[instrument(skip(self, task), fields(task_id = %task.id), err)]
    pub async fn submit_task(&self, task: Task) -> DomainResult<Uuid> {
        task.validate()?;

        let known = self.store.list().await?;
        self.dependency_resolver
            .validate_dependencies(&task, &known)?;

        let mut with_new = known;
        with_new.push(task.clone());
        if let Some(cycle) = self.dependency_resolver.detect_cycle(&with_new) {
            warn!("circular dependency detected: {:?}", cycle);
            return Err(DomainError::DependencyCycle(cycle));
        }

        let id = task.id;
        self.store.insert(&task).await?;
        info!(task_id = %id, "task submitted");
        Ok(id)
    }

    /// Current state of a task: status plus, once terminal, the last
    /// attempt and its tier.
    pub async fn status(&self, task_id: Uuid) -> DomainResult<TaskStatusReport> {
        let task = self
            .store
            .get(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        let results = self.results.lock().await;
        let disposition = results.get(&task_id);
        Ok(TaskStatusReport {
            task_id,
            state: task.status,
            last_attempt: disposition.and_then(|d| d.attempts.last().cloned()),
            escalation_tier: disposition.and_then(|d| d.final_tier),
        })
    }

    /// Cancel a task. Idempotent: cancelling a terminal task is a no-op.
    ///
    /// A task with an attempt in flight finishes recording that attempt
    /// before its router observes the cancellation; partial attempts are
    /// never dropped from the ledger.
    pub async fn cancel(&self, task_id: Uuid) -> DomainResult<()> {
        let task = self
            .store
            .get(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        if !task.is_terminal() {
            self.store.put_status(task_id, TaskStatus::Abandoned).await?;
            info!(task_id = %task_id, "task cancelled");
        }
        Ok(())
    }

    /// Drain the backlog: claim ready tasks, run each to terminal, review
    /// produced artifacts, and aggregate dispositions.
    #[instrument(skip(self))]
    pub async fn run(&self) -> DomainResult<RunSummary> {
        let mut runners: JoinSet<DomainResult<TaskDisposition>> = JoinSet::new();
        let mut in_flight = 0usize;
        let mut completed: Vec<Uuid> = Vec::new();

        loop {
            // Fill the runner pool from the backlog.
            while in_flight < self.config.runtime.max_concurrent_tasks {
                match self.store.claim_next().await? {
                    Some(task) => {
                        in_flight += 1;
                        runners.spawn(self.spawn_runner(task));
                    }
                    None => break,
                }
            }

            if in_flight == 0 {
                let abandoned = self.abandon_unrunnable().await?;
                if abandoned.is_empty() {
                    break;
                }
                completed.extend(abandoned);
                continue;
            }

            // Wait for one runner; its completion may unblock dependents.
            if let Some(joined) = runners.join_next().await {
                in_flight -= 1;
                match joined {
                    Ok(Ok(disposition)) => {
                        completed.push(disposition.task_id);
                        self.results
                            .lock()
                            .await
                            .insert(disposition.task_id, disposition);
                    }
                    Ok(Err(err)) => {
                        // Ledger integrity violations and other fatal errors
                        // stop the whole run; they indicate a bug, not a
                        // task failure.
                        error!(error = %err, "task runner failed fatally");
                        return Err(err);
                    }
                    Err(join_err) => {
                        return Err(DomainError::ExecutionFailed(format!(
                            "task runner panicked: {join_err}"
                        )));
                    }
                }
            }
        }

        // Only this run's tasks. The results map is kept, not drained: it
        // still backs `status` queries after the run.
        let results = self.results.lock().await;
        let mut dispositions: Vec<TaskDisposition> = completed
            .iter()
            .filter_map(|id| results.get(id).cloned())
            .collect();
        dispositions.sort_by_key(|d| d.task_id);
        Ok(RunSummary { dispositions })
    }

    /// Build the future executing one claimed task in isolation.
    fn spawn_runner(
        &self,
        task: Task,
    ) -> impl std::future::Future<Output = DomainResult<TaskDisposition>> + Send + 'static {
        let council = self.council.clone();
        let store = Arc::clone(&self.store);
        let evidence = Arc::clone(&self.evidence);
        let reviewer = Arc::clone(&self.reviewer);
        let reviser = Arc::clone(&self.reviser);
        let config = self.config.clone();

        async move {
            let gatherer =
                ContextGatherer::new(evidence, config.escalation.max_followup_questions);
            // Fresh router per task: its ledger partition is touched by
            // nothing else.
            let mut router =
                CouncilRouter::new(council, gatherer, store, config.clone());
            let mut disposition = router.execute(task).await?;

            if disposition.status == TaskStatus::Succeeded {
                if let Some(artifact) = disposition.artifact.clone() {
                    let convergence = ConvergenceLoop::new(
                        config.convergence.clone(),
                        Duration::from_secs(config.runtime.review_timeout_secs),
                    );
                    let report = convergence.run(artifact, reviewer, reviser).await?;
                    disposition.convergence = Some(report);
                }
            }
            Ok(disposition)
        }
    }

    /// Abandon queued tasks that can never become ready because a
    /// dependency terminated without success. Returns the abandoned ids so
    /// the run loop can re-check the backlog and fold them into the
    /// summary.
    async fn abandon_unrunnable(&self) -> DomainResult<Vec<Uuid>> {
        let tasks = self.store.list().await?;
        let statuses: HashMap<Uuid, TaskStatus> =
            tasks.iter().map(|t| (t.id, t.status)).collect();

        let mut abandoned = Vec::new();
        for task in &tasks {
            if task.status == TaskStatus::Queued
                && self
                    .dependency_resolver
                    .has_failed_dependency(task, &statuses)
            {
                warn!(task_id = %task.id, "abandoning task with failed dependency");
                self.store
                    .put_status(task.id, TaskStatus::Abandoned)
                    .await?;
                self.results.lock().await.insert(
                    task.id,
                    TaskDisposition {
                        task_id: task.id,
                        title: task.title.clone(),
                        status: TaskStatus::Abandoned,
                        final_tier: None,
                        attempts: Vec::new(),
                        abandon_reason: Some("dependency_failed".to_string()),
                        artifact: None,
                        convergence: None,
                    },
                );
                abandoned.push(task.id);
            }
        }
        Ok(abandoned)
    }
}
