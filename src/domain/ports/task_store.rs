//! Task store port - the backlog.
//!
//! A key-value interface keyed by task id. Persistence layout is the
//! store's concern; the engine only requires the contract below.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Task, TaskStatus};

/// Repository port for the task backlog.
///
/// The backlog is the only resource mutated by more than one concurrent
/// task runner, so `claim_next` must be an atomic claim-or-skip: two
/// runners can never claim the same task.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task.
    async fn insert(&self, task: &Task) -> DomainResult<()>;

    /// Get a task by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>>;

    /// Update a task's status.
    async fn put_status(&self, id: Uuid, status: TaskStatus) -> DomainResult<()>;

    /// Atomically claim the next ready task: queued, unclaimed, and with
    /// every dependency `Succeeded`. Returns `None` when nothing is ready.
    async fn claim_next(&self) -> DomainResult<Option<Task>>;

    /// All tasks, in insertion order.
    async fn list(&self) -> DomainResult<Vec<Task>>;
}
