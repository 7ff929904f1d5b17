//! In-memory task store.
//!
//! Backing store for tests and the demo CLI. A single mutex guards the
//! backlog, so `claim_next` is an atomic claim-or-skip: a task is handed to
//! exactly one runner.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Task, TaskStatus};

#[derive(Default)]
struct StoreInner {
    tasks: HashMap<Uuid, Task>,
    /// Insertion order, for deterministic listing and tie-breaking.
    order: Vec<Uuid>,
    /// Tasks handed out by `claim_next` and not yet terminal.
    claimed: HashSet<Uuid>,
}

/// Mutex-guarded in-memory backlog.
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::domain::ports::TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &Task) -> DomainResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.tasks.contains_key(&task.id) {
            return Err(DomainError::ValidationFailed(format!(
                "task {} already exists",
                task.id
            )));
        }
        inner.order.push(task.id);
        inner.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>> {
        Ok(self.inner.lock().await.tasks.get(&id).cloned())
    }

    /// Update a task's status.
    ///
    /// Terminal statuses are sticky: once a task is `Succeeded` or
    /// `Abandoned` (e.g. cancelled out-of-band), later writes are ignored
    /// so a racing runner cannot resurrect it.
    async fn put_status(&self, id: Uuid, status: TaskStatus) -> DomainResult<()> {
        let mut inner = self.inner.lock().await;
        let task = inner
            .tasks
            .get_mut(&id)
            .ok_or(DomainError::TaskNotFound(id))?;
        if !task.status.is_terminal() {
            task.status = status;
            task.updated_at = chrono::Utc::now();
        }
        // A terminal task can never be re-claimed; drop its claim marker.
        let terminal = task.status.is_terminal();
        if terminal {
            inner.claimed.remove(&id);
        }
        Ok(())
    }

    async fn claim_next(&self) -> DomainResult<Option<Task>> {
        let mut inner = self.inner.lock().await;

        let ready = inner
            .order
            .iter()
            .enumerate()
            .filter_map(|(position, id)| inner.tasks.get(id).map(|task| (position, task)))
            .filter(|(_, task)| {
                task.status == TaskStatus::Queued
                    && !inner.claimed.contains(&task.id)
                    && task.depends_on.iter().all(|dep| {
                        inner
                            .tasks
                            .get(dep)
                            .is_some_and(|d| d.status == TaskStatus::Succeeded)
                    })
            })
            // Highest priority first; insertion order breaks ties.
            .max_by_key(|(position, task)| (task.priority, std::cmp::Reverse(*position)))
            .map(|(_, task)| task.clone());

        if let Some(task) = ready {
            inner.claimed.insert(task.id);
            return Ok(Some(task));
        }
        Ok(None)
    }

    async fn list(&self) -> DomainResult<Vec<Task>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect())
    }
}
