//! Attempt domain model.
//!
//! An attempt is one dispatch-and-verify cycle for a task at a given tier.
//! Attempts are immutable once recorded; the ledger is append-only, so a
//! task's attempt history is a complete audit trail.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tier::BackendTier;

/// Severity of a single finding, from a verifier or a reviewer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Nit,
    Minor,
    Major,
    Blocker,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nit => "nit",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Blocker => "blocker",
        }
    }

    /// Blockers and majors gate convergence; minors and nits do not.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocker | Self::Major)
    }
}

/// A single structured piece of feedback from verification or review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Coarse failure category, e.g. "tests", "types", "timeout".
    pub category: String,
    pub message: String,
}

impl Finding {
    pub fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
        }
    }
}

/// Result of verifying one attempt against the task's acceptance criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Pass,
    Partial,
    Fail,
}

impl Verification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Partial => "partial",
            Self::Fail => "fail",
        }
    }
}

/// One dispatch-and-verify cycle for a task.
///
/// Sequence numbers are monotonic per task, starting at 1. Recording is
/// the ledger's job; an attempt is never edited after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Task this attempt belongs to.
    pub task_id: Uuid,
    /// Monotonic per-task sequence number, starting at 1.
    pub sequence: u64,
    /// Backend tier that produced this attempt.
    pub tier: BackendTier,
    /// Reported confidence, 0-100.
    pub confidence: u8,
    /// Verification result against acceptance criteria.
    pub verification: Verification,
    /// Structured feedback from verification.
    pub findings: Vec<Finding>,
    /// Questions the backend could not answer from its inputs.
    pub open_questions: Vec<String>,
    /// When the attempt was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Attempt {
    /// Whether this attempt amounts to terminal success at the given
    /// confidence threshold.
    pub fn passed(&self, confidence_threshold: u8) -> bool {
        self.verification == Verification::Pass && self.confidence >= confidence_threshold
    }

    /// Coarse failure category for escalation-state tracking: the category
    /// of the highest-severity finding, or empty when there are none.
    pub fn failure_category(&self) -> &str {
        self.findings
            .iter()
            .max_by_key(|f| f.severity)
            .map_or("", |f| f.category.as_str())
    }

    /// Order-insensitive hash of this attempt's open question set.
    pub fn question_set_hash(&self) -> u64 {
        question_set_hash(&self.open_questions)
    }
}

/// Order-insensitive hash of a question set.
///
/// Used to detect that `GatherContext` was already issued for an identical
/// set of questions; the guardrail against infinite context-gathering loops.
pub fn question_set_hash(questions: &[String]) -> u64 {
    let mut sorted: Vec<&str> = questions.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let mut hasher = DefaultHasher::new();
    sorted.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(verification: Verification, confidence: u8) -> Attempt {
        Attempt {
            task_id: Uuid::new_v4(),
            sequence: 1,
            tier: BackendTier::FastSurgeon,
            confidence,
            verification,
            findings: Vec::new(),
            open_questions: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_passed_requires_pass_and_threshold() {
        assert!(attempt(Verification::Pass, 85).passed(80));
        assert!(!attempt(Verification::Pass, 79).passed(80));
        assert!(!attempt(Verification::Partial, 95).passed(80));
        assert!(!attempt(Verification::Fail, 100).passed(80));
    }

    #[test]
    fn test_failure_category_picks_highest_severity() {
        let mut a = attempt(Verification::Fail, 30);
        a.findings = vec![
            Finding::new(Severity::Minor, "style", "nit"),
            Finding::new(Severity::Blocker, "tests", "suite red"),
            Finding::new(Severity::Major, "types", "mismatch"),
        ];
        assert_eq!(a.failure_category(), "tests");

        let empty = attempt(Verification::Fail, 0);
        assert_eq!(empty.failure_category(), "");
    }

    #[test]
    fn test_question_set_hash_ignores_order_and_duplicates() {
        let a = vec!["where is the config?".to_string(), "which schema?".to_string()];
        let b = vec![
            "which schema?".to_string(),
            "where is the config?".to_string(),
            "which schema?".to_string(),
        ];
        assert_eq!(question_set_hash(&a), question_set_hash(&b));

        let c = vec!["a different question".to_string()];
        assert_ne!(question_set_hash(&a), question_set_hash(&c));
    }

    #[test]
    fn test_severity_blocking() {
        assert!(Severity::Blocker.is_blocking());
        assert!(Severity::Major.is_blocking());
        assert!(!Severity::Minor.is_blocking());
        assert!(!Severity::Nit.is_blocking());
    }
}
