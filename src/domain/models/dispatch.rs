//! Dispatch payloads exchanged with backend and reviewer capabilities.
//!
//! Everything a backend sees is passed explicitly per call; there is no
//! process-wide mutable configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attempt::{Finding, Verification};

/// The task-derived input handed to a backend for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub task_id: Uuid,
    pub description: String,
    /// Ordered, checkable acceptance conditions. The router never mutates
    /// these.
    pub acceptance_criteria: Vec<String>,
}

/// An evidence-grounded answer to a previously open question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    /// Opaque evidence reference, e.g. a file-and-line or resource id.
    pub locator: String,
    pub summary: String,
}

/// Context accumulated across attempts on one task.
///
/// Grows monotonically: answers and feedback from earlier attempts are
/// carried into every later dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedContext {
    /// Answers gathered for earlier open questions.
    pub answers: Vec<Answer>,
    /// Findings from prior failed attempts.
    pub prior_feedback: Vec<Finding>,
    /// Questions that are still open (unresolved or newly admitted).
    pub open_questions: Vec<String>,
}

impl AccumulatedContext {
    /// Merge findings from a completed attempt.
    pub fn absorb_feedback(&mut self, findings: &[Finding]) {
        for finding in findings {
            if !self.prior_feedback.contains(finding) {
                self.prior_feedback.push(finding.clone());
            }
        }
    }
}

/// A reviewable work product produced by a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Task that produced this artifact.
    pub task_id: Uuid,
    /// Opaque locator for the work product.
    pub uri: String,
    /// Bumped by each revision during convergence.
    pub revision: u32,
}

impl Artifact {
    pub fn new(task_id: Uuid, uri: impl Into<String>) -> Self {
        Self {
            task_id,
            uri: uri.into(),
            revision: 0,
        }
    }
}

/// What a backend reports for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    /// Verification against acceptance criteria.
    pub verification: Verification,
    /// Reported confidence, 0-100.
    pub confidence: u8,
    /// Structured feedback on the attempt.
    pub findings: Vec<Finding>,
    /// Questions the backend wants answered before the next attempt.
    pub open_questions: Vec<String>,
    /// Work product, when the attempt produced something reviewable.
    pub artifact: Option<Artifact>,
}

impl AttemptOutcome {
    /// A failed outcome with zero confidence; how timeouts and backend
    /// errors enter the normal escalation path.
    pub fn failed(finding: Finding) -> Self {
        Self {
            verification: Verification::Fail,
            confidence: 0,
            findings: vec![finding],
            open_questions: Vec::new(),
            artifact: None,
        }
    }
}
