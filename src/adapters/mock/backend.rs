//! Scripted mock backend.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AccumulatedContext, Artifact, AttemptOutcome, BackendTier, Finding, Severity, TaskPayload,
    Verification,
};
use crate::domain::ports::Backend;

/// One scripted response for a mock backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedOutcome {
    /// Verification result to report.
    pub verification: Verification,
    /// Confidence to report, 0-100.
    pub confidence: u8,
    /// Findings to attach.
    pub findings: Vec<Finding>,
    /// Open questions to raise.
    pub open_questions: Vec<String>,
    /// Whether a reviewable artifact is produced.
    pub produces_artifact: bool,
    /// Simulated work duration in milliseconds, for timeout tests.
    pub delay_ms: u64,
}

impl Default for ScriptedOutcome {
    fn default() -> Self {
        Self {
            verification: Verification::Pass,
            confidence: 90,
            findings: Vec::new(),
            open_questions: Vec::new(),
            produces_artifact: true,
            delay_ms: 0,
        }
    }
}

impl ScriptedOutcome {
    /// A passing outcome at the given confidence.
    pub fn pass(confidence: u8) -> Self {
        Self {
            confidence,
            ..Default::default()
        }
    }

    /// A failing outcome at the given confidence, with one finding.
    pub fn fail(confidence: u8, category: &str) -> Self {
        Self {
            verification: Verification::Fail,
            confidence,
            findings: vec![Finding::new(
                Severity::Major,
                category,
                format!("{category} check failed"),
            )],
            produces_artifact: false,
            ..Default::default()
        }
    }

    /// A failing outcome that raises open questions.
    pub fn fail_with_questions(confidence: u8, questions: &[&str]) -> Self {
        Self {
            verification: Verification::Fail,
            confidence,
            open_questions: questions.iter().map(ToString::to_string).collect(),
            produces_artifact: false,
            ..Default::default()
        }
    }

    fn into_outcome(self, task_id: Uuid) -> AttemptOutcome {
        let artifact = self
            .produces_artifact
            .then(|| Artifact::new(task_id, format!("artifact://{task_id}")));
        AttemptOutcome {
            verification: self.verification,
            confidence: self.confidence,
            findings: self.findings,
            open_questions: self.open_questions,
            artifact,
        }
    }
}

/// Backend that replays scripted outcomes in order, then repeats the last.
///
/// The script is shared across tiers; attempts made at any tier consume
/// from the same queue, which matches how escalation walks one task through
/// the council.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    /// Tiers seen by this backend, in dispatch order.
    dispatched_tiers: Mutex<Vec<BackendTier>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            dispatched_tiers: Mutex::new(Vec::new()),
        }
    }

    /// Every tier this backend was dispatched at, in order.
    pub async fn dispatched_tiers(&self) -> Vec<BackendTier> {
        self.dispatched_tiers.lock().await.clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn attempt(
        &self,
        tier: BackendTier,
        payload: &TaskPayload,
        _context: &AccumulatedContext,
    ) -> DomainResult<AttemptOutcome> {
        self.dispatched_tiers.lock().await.push(tier);

        let scripted = {
            let mut script = self.script.lock().await;
            if script.len() > 1 {
                script.pop_front().unwrap_or_default()
            } else {
                script.front().cloned().unwrap_or_default()
            }
        };

        if scripted.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(scripted.delay_ms)).await;
        }
        Ok(scripted.into_outcome(payload.task_id))
    }
}

/// Backend with an independent script queue per task.
///
/// Keeps concurrent runs deterministic: each task consumes its own queue no
/// matter how runners interleave. Tasks without a script pass on the first
/// attempt.
#[derive(Default)]
pub struct PerTaskScriptedBackend {
    scripts: Mutex<HashMap<Uuid, VecDeque<ScriptedOutcome>>>,
}

impl PerTaskScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the script for one task.
    pub async fn script_task(&self, task_id: Uuid, script: Vec<ScriptedOutcome>) {
        self.scripts.lock().await.insert(task_id, script.into());
    }
}

#[async_trait]
impl Backend for PerTaskScriptedBackend {
    fn name(&self) -> &'static str {
        "per_task_scripted"
    }

    async fn attempt(
        &self,
        _tier: BackendTier,
        payload: &TaskPayload,
        _context: &AccumulatedContext,
    ) -> DomainResult<AttemptOutcome> {
        let scripted = {
            let mut scripts = self.scripts.lock().await;
            match scripts.get_mut(&payload.task_id) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
                Some(queue) => queue.front().cloned().unwrap_or_default(),
                None => ScriptedOutcome::default(),
            }
        };

        if scripted.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(scripted.delay_ms)).await;
        }
        Ok(scripted.into_outcome(payload.task_id))
    }
}
