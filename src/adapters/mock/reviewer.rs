//! Scripted mock reviewer and a revision-counting reviser.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Artifact, Finding};
use crate::domain::ports::{Reviewer, Reviser};

/// Reviewer that replays scripted finding lists round by round, then keeps
/// returning the last one.
pub struct ScriptedReviewer {
    script: Mutex<VecDeque<Vec<Finding>>>,
}

impl ScriptedReviewer {
    pub fn new(script: Vec<Vec<Finding>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    /// A reviewer that always reports a clean round.
    pub fn always_clean() -> Self {
        Self::new(vec![Vec::new()])
    }
}

#[async_trait]
impl Reviewer for ScriptedReviewer {
    async fn review(&self, _artifact: &Artifact) -> DomainResult<Vec<Finding>> {
        let mut script = self.script.lock().await;
        if script.len() > 1 {
            Ok(script.pop_front().unwrap_or_default())
        } else {
            Ok(script.front().cloned().unwrap_or_default())
        }
    }
}

/// Reviser that bumps the artifact revision and counts invocations.
#[derive(Default)]
pub struct RevisionCounter {
    revisions: Mutex<u32>,
}

impl RevisionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of revisions performed so far.
    pub async fn count(&self) -> u32 {
        *self.revisions.lock().await
    }
}

#[async_trait]
impl Reviser for RevisionCounter {
    async fn revise(&self, artifact: &Artifact, _findings: &[Finding]) -> DomainResult<Artifact> {
        *self.revisions.lock().await += 1;
        let mut revised = artifact.clone();
        revised.revision += 1;
        Ok(revised)
    }
}
