//! Domain errors for the Conclave orchestration engine.

use thiserror::Error;
use uuid::Uuid;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[Uuid]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Domain-level errors that can occur in the Conclave system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    /// Ledger integrity violation. Indicates a caller ordering bug and is
    /// never recovered from; task execution must stop immediately.
    #[error("Duplicate attempt sequence for task {task_id}: expected {expected}, got {got}")]
    DuplicateSequence {
        task_id: Uuid,
        expected: u64,
        got: u64,
    },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// A question the context gatherer could not ground in evidence.
    /// The question stays open; callers must not fabricate an answer.
    #[error("Unresolved question: {0}")]
    Unresolved(String),

    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<Uuid>),

    #[error("Task {task_id} depends on unknown task {dependency}")]
    MissingDependency { task_id: Uuid, dependency: Uuid },

    #[error("No backend registered for tier: {0}")]
    MissingTier(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DomainError {
    fn from(err: serde_yaml::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
