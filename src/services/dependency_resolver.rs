//! Dependency validation and cycle detection for the backlog.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Task, TaskStatus};

/// Service for resolving task dependencies and detecting circular
/// dependencies.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

// Standalone helper for cycle detection (no self needed)
fn detect_cycle_util(
    node: Uuid,
    graph: &HashMap<Uuid, Vec<Uuid>>,
    visited: &mut HashSet<Uuid>,
    rec_stack: &mut HashSet<Uuid>,
    path: &mut Vec<Uuid>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(&node) {
        for &neighbor in neighbors {
            if !visited.contains(&neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(&neighbor) {
                // Cycle detected
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(&node);
    path.pop();
    false
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Validate that every dependency of `task` exists among the known
    /// tasks.
    pub fn validate_dependencies(&self, task: &Task, known: &[Task]) -> DomainResult<()> {
        let known_ids: HashSet<Uuid> = known.iter().map(|t| t.id).collect();
        for &dep_id in &task.depends_on {
            if !known_ids.contains(&dep_id) && dep_id != task.id {
                return Err(DomainError::MissingDependency {
                    task_id: task.id,
                    dependency: dep_id,
                });
            }
        }
        Ok(())
    }

    /// Detect a circular dependency in a set of tasks, returning the cycle
    /// path if one exists.
    pub fn detect_cycle(&self, tasks: &[Task]) -> Option<Vec<Uuid>> {
        let mut graph: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for task in tasks {
            graph
                .entry(task.id)
                .or_default()
                .extend(task.depends_on.iter().copied());
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for task_id in graph.keys() {
            if !visited.contains(task_id)
                && detect_cycle_util(*task_id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path);
            }
        }
        None
    }

    /// Dependencies of `task` that are not yet `Succeeded`.
    pub fn unmet_dependencies(
        &self,
        task: &Task,
        statuses: &HashMap<Uuid, TaskStatus>,
    ) -> Vec<Uuid> {
        task.depends_on
            .iter()
            .copied()
            .filter(|dep| statuses.get(dep) != Some(&TaskStatus::Succeeded))
            .collect()
    }

    /// Whether any dependency of `task` is terminal without success, which
    /// means the task can never become ready.
    pub fn has_failed_dependency(
        &self,
        task: &Task,
        statuses: &HashMap<Uuid, TaskStatus>,
    ) -> bool {
        task.depends_on
            .iter()
            .any(|dep| statuses.get(dep) == Some(&TaskStatus::Abandoned))
    }
}
