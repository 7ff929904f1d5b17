//! Council router: the per-task state machine.
//!
//! Owns a task from claim to terminal state. Selects a backend tier,
//! dispatches the attempt, records it in the ledger, consults the
//! escalation policy, and loops. Side effects are confined to ledger
//! appends and task status transitions; acceptance criteria are never
//! mutated.
//!
//! The "council" is a strategy set keyed by tier: a mapping from tier enum
//! to a backend capability reference.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AccumulatedContext, Artifact, Attempt, AttemptOutcome, BackendTier, ConvergenceReport,
    EngineConfig, Finding, Severity, Task, TaskPayload, TaskStatus,
};
use crate::domain::ports::{Backend, TaskStore};
use crate::services::context_gatherer::ContextGatherer;
use crate::services::escalation::{decide, EscalationAction, EscalationState};
use crate::services::ledger::AttemptLedger;

/// The strategy set: one backend capability per tier.
pub type TierCouncil = BTreeMap<BackendTier, Arc<dyn Backend>>;

/// Terminal summary of one task's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDisposition {
    pub task_id: Uuid,
    pub title: String,
    /// Terminal status: `Succeeded` or `Abandoned`.
    pub status: TaskStatus,
    /// Tier of the last attempt, if any was made.
    pub final_tier: Option<BackendTier>,
    /// The full attempt ledger for the task, for diagnosis.
    pub attempts: Vec<Attempt>,
    /// Why the task was abandoned, when it was.
    pub abandon_reason: Option<String>,
    /// Work product of the successful attempt, if reviewable.
    pub artifact: Option<Artifact>,
    /// Filled in by the coordinator when the artifact went through review.
    pub convergence: Option<ConvergenceReport>,
}

/// Executes one task at a time against the backend council.
///
/// Each router instance owns its own ledger partition; a task's ledger and
/// escalation state are only ever touched by the single router executing
/// that task.
pub struct CouncilRouter {
    council: TierCouncil,
    gatherer: ContextGatherer,
    store: Arc<dyn TaskStore>,
    config: EngineConfig,
    ledger: AttemptLedger,
}

impl CouncilRouter {
    pub fn new(
        council: TierCouncil,
        gatherer: ContextGatherer,
        store: Arc<dyn TaskStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            council,
            gatherer,
            store,
            config,
            ledger: AttemptLedger::new(),
        }
    }

    /// Drive a claimed task to a terminal state.
    #[instrument(skip(self, task), fields(task_id = %task.id, title = %task.title))]
    pub async fn execute(&mut self, mut task: Task) -> DomainResult<TaskDisposition> {
        let payload = TaskPayload {
            task_id: task.id,
            description: task.description.clone(),
            acceptance_criteria: task.acceptance_criteria.clone(),
        };
        let mut tier = task.initial_tier();
        let mut context = AccumulatedContext::default();
        let mut artifact: Option<Artifact> = None;

        loop {
            if self.cancelled(task.id).await? {
                task.cancel();
                return Ok(self.disposition(task, Some("cancelled".to_string()), None));
            }

            task.transition_to(TaskStatus::Dispatched)?;
            self.store.put_status(task.id, task.status).await?;
            debug!(tier = %tier, "dispatching attempt");

            let outcome = self.dispatch(tier, &payload, &context).await;
            let sequence = self.ledger.len(task.id) + 1;
            let attempt = Attempt {
                task_id: task.id,
                sequence,
                tier,
                confidence: outcome.confidence.min(100),
                verification: outcome.verification,
                findings: outcome.findings.clone(),
                open_questions: outcome.open_questions.clone(),
                recorded_at: chrono::Utc::now(),
            };
            // A DuplicateSequence here is a router bug; stop immediately.
            self.ledger.record(attempt)?;
            if outcome.artifact.is_some() {
                artifact = outcome.artifact;
            }

            task.transition_to(TaskStatus::Verifying)?;
            self.store.put_status(task.id, task.status).await?;

            let state = EscalationState::derive(
                self.ledger.history(task.id),
                &self.config.escalation,
            );
            match decide(&state, &self.config.escalation) {
                None => {
                    task.transition_to(TaskStatus::Succeeded)?;
                    self.store.put_status(task.id, task.status).await?;
                    info!(attempts = state.attempt_count, tier = %tier, "task succeeded");
                    return Ok(self.disposition(task, None, artifact));
                }
                Some(EscalationAction::RetrySameTier) => {
                    debug!(tier = %tier, "retrying at same tier");
                    context.absorb_feedback(&outcome.findings);
                }
                Some(EscalationAction::EscalateTier(next)) => {
                    task.transition_to(TaskStatus::Escalating)?;
                    self.store.put_status(task.id, task.status).await?;
                    info!(from = %tier, to = %next, "escalating tier");
                    context.absorb_feedback(&outcome.findings);
                    tier = next;
                }
                Some(EscalationAction::GatherContext(questions)) => {
                    task.transition_to(TaskStatus::GatheringContext)?;
                    self.store.put_status(task.id, task.status).await?;
                    self.gather(&mut context, questions, &task.description)
                        .await?;
                    context.absorb_feedback(&outcome.findings);
                }
                Some(EscalationAction::Abandon(reason)) => {
                    task.transition_to(TaskStatus::Abandoned)?;
                    self.store.put_status(task.id, task.status).await?;
                    warn!(reason = %reason, attempts = state.attempt_count, "task abandoned");
                    return Ok(self.disposition(task, Some(reason), None));
                }
            }
        }
    }

    /// Dispatch one attempt with the configured timeout.
    ///
    /// A timed-out or errored dispatch becomes a normal failed attempt
    /// (verification fail, confidence 0) that flows through the escalation
    /// policy like any other; transient failures are absorbed by the
    /// ladder, never surfaced individually.
    async fn dispatch(
        &self,
        tier: BackendTier,
        payload: &TaskPayload,
        context: &AccumulatedContext,
    ) -> AttemptOutcome {
        let Some(backend) = self.council.get(&tier) else {
            return AttemptOutcome::failed(Finding::new(
                Severity::Blocker,
                "configuration",
                format!("no backend registered for tier {tier}"),
            ));
        };

        let timeout = Duration::from_secs(self.config.runtime.dispatch_timeout_secs);
        match tokio::time::timeout(timeout, backend.attempt(tier, payload, context)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                warn!(tier = %tier, error = %err, "backend error, treating as failed attempt");
                AttemptOutcome::failed(Finding::new(
                    Severity::Major,
                    "backend_error",
                    err.to_string(),
                ))
            }
            Err(_) => {
                warn!(tier = %tier, "dispatch timed out, treating as failed attempt");
                AttemptOutcome::failed(Finding::new(
                    Severity::Major,
                    "timeout",
                    format!("dispatch timed out after {}s", timeout.as_secs()),
                ))
            }
        }
    }

    /// Run one context-gathering cycle and merge the results.
    async fn gather(
        &self,
        context: &mut AccumulatedContext,
        questions: Vec<String>,
        scope: &str,
    ) -> DomainResult<()> {
        let carried = context.open_questions.clone();
        let admitted = self.gatherer.admit_followups(&carried, &questions);
        let mut to_gather = carried;
        for question in admitted {
            if !to_gather.contains(&question) {
                to_gather.push(question);
            }
        }

        let resolution = self.gatherer.resolve(&to_gather, scope).await?;
        context.answers.extend(resolution.answers);
        context.open_questions = resolution.still_open;
        Ok(())
    }

    /// Whether the task was cancelled out from under us via the store.
    async fn cancelled(&self, task_id: Uuid) -> DomainResult<bool> {
        let stored = self
            .store
            .get(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        Ok(stored.status == TaskStatus::Abandoned)
    }

    fn disposition(
        &mut self,
        task: Task,
        abandon_reason: Option<String>,
        artifact: Option<Artifact>,
    ) -> TaskDisposition {
        let attempts = self.ledger.take_history(task.id);
        TaskDisposition {
            task_id: task.id,
            title: task.title,
            status: task.status,
            final_tier: attempts.last().map(|a| a.tier),
            attempts,
            abandon_reason,
            artifact,
            convergence: None,
        }
    }
}
