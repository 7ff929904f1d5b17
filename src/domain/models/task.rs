//! Task domain model.
//!
//! Tasks are discrete units of work attempted by a council of reasoning
//! backends. They form a DAG with dependencies; a task may not be dispatched
//! until every dependency has reached terminal success.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

use super::tier::BackendTier;

/// Status of a task in the council state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is defined and waiting to be claimed.
    Queued,
    /// An attempt is in flight at the selected tier.
    Dispatched,
    /// An attempt result is being checked against the escalation policy.
    Verifying,
    /// Open questions from the last attempt are being resolved.
    GatheringContext,
    /// Moving to a more expensive tier before the next attempt.
    Escalating,
    /// Task completed successfully.
    Succeeded,
    /// Task was given up on, or cancelled.
    Abandoned,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Queued
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Dispatched => "dispatched",
            Self::Verifying => "verifying",
            Self::GatheringContext => "gathering_context",
            Self::Escalating => "escalating",
            Self::Succeeded => "succeeded",
            Self::Abandoned => "abandoned",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "queued" => Some(Self::Queued),
            "dispatched" => Some(Self::Dispatched),
            "verifying" => Some(Self::Verifying),
            "gathering_context" => Some(Self::GatheringContext),
            "escalating" => Some(Self::Escalating),
            "succeeded" => Some(Self::Succeeded),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Abandoned)
    }

    /// Valid transitions from this status.
    ///
    /// `Abandoned` is reachable from every non-terminal state because
    /// cancellation may land at any time.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::Queued => vec![Self::Dispatched, Self::Abandoned],
            Self::Dispatched => vec![Self::Verifying, Self::Abandoned],
            Self::Verifying => vec![
                Self::Succeeded,
                Self::GatheringContext,
                Self::Escalating,
                Self::Dispatched, // retry at the same tier
                Self::Abandoned,
            ],
            Self::GatheringContext => vec![Self::Dispatched, Self::Abandoned],
            Self::Escalating => vec![Self::Dispatched, Self::Abandoned],
            Self::Succeeded | Self::Abandoned => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Priority level for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A discrete unit of work attempted by the backend council.
///
/// Immutable after creation except for `status`, which is owned exclusively
/// by the council router executing the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable title
    pub title: String,
    /// Detailed description of the work
    pub description: String,
    /// Ordered list of checkable acceptance conditions
    pub acceptance_criteria: Vec<String>,
    /// Task IDs that must be `Succeeded` before this task may start
    pub depends_on: Vec<Uuid>,
    /// Priority for backlog claiming order
    pub priority: TaskPriority,
    /// Architecturally complex tasks skip the cheapest tier
    pub architecturally_complex: bool,
    /// Current status
    pub status: TaskStatus,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task from a description. Title is auto-generated.
    pub fn new(description: impl Into<String>) -> Self {
        let description = description.into();
        let title = generate_title(&description);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            acceptance_criteria: Vec::new(),
            depends_on: Vec::new(),
            priority: TaskPriority::default(),
            architecturally_complex: false,
            status: TaskStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an acceptance criterion.
    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.acceptance_criteria.push(criterion.into());
        self
    }

    /// Add a dependency.
    pub fn with_dependency(mut self, task_id: Uuid) -> Self {
        if !self.depends_on.contains(&task_id) && task_id != self.id {
            self.depends_on.push(task_id);
        }
        self
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Flag the task as architecturally complex.
    pub fn architecturally_complex(mut self) -> Self {
        self.architecturally_complex = true;
        self
    }

    /// Tier the first attempt is dispatched at.
    pub fn initial_tier(&self) -> BackendTier {
        if self.architecturally_complex {
            BackendTier::WideContextAnalyst
        } else {
            BackendTier::FastSurgeon
        }
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to new status.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> DomainResult<()> {
        if !self.can_transition_to(new_status) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "not a valid council state machine edge".to_string(),
            });
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancel the task. Idempotent: cancelling a terminal task is a no-op.
    pub fn cancel(&mut self) {
        if !self.status.is_terminal() {
            self.status = TaskStatus::Abandoned;
            self.updated_at = Utc::now();
        }
    }

    /// Check if task is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validate task invariants on submission.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.is_empty() {
            return Err(DomainError::ValidationFailed(
                "task title cannot be empty".to_string(),
            ));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "task description cannot be empty".to_string(),
            ));
        }
        if self.depends_on.contains(&self.id) {
            return Err(DomainError::ValidationFailed(
                "task cannot depend on itself".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a short title from a description string.
/// Takes the first line, truncates at ~80 chars on a word boundary.
fn generate_title(description: &str) -> String {
    let first_line = description.lines().next().unwrap_or(description).trim();
    if first_line.is_empty() {
        return "Untitled task".to_string();
    }
    let max_len = 80;
    if first_line.len() <= max_len {
        return first_line.to_string();
    }
    // Byte 80 may fall inside a multibyte character; the cut must land on
    // a char boundary.
    let mut cut = max_len;
    while !first_line.is_char_boundary(cut) {
        cut -= 1;
    }
    match first_line[..cut].rfind(' ') {
        Some(pos) => format!("{}...", &first_line[..pos]),
        None => format!("{}...", &first_line[..cut]),
    }
}
