//! Backlog file loading.
//!
//! A backlog is a YAML file of tasks with optional per-task scripted
//! backend outcomes, so a run can be demonstrated end to end without a
//! live backend.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::mock::ScriptedOutcome;
use crate::domain::models::{Finding, Task, TaskPriority};

/// One task entry in a backlog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogTask {
    /// Name used to reference this task from `depends_on`.
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub architecturally_complex: bool,
    /// Names of backlog tasks this one depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Scripted backend outcomes, consumed attempt by attempt.
    #[serde(default)]
    pub script: Vec<ScriptedOutcome>,
}

/// A parsed backlog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacklogFile {
    pub tasks: Vec<BacklogTask>,
    /// Scripted reviewer findings, one list per review round.
    #[serde(default)]
    pub review_script: Vec<Vec<Finding>>,
}

/// A backlog resolved into domain tasks plus their backend scripts.
#[derive(Debug, Clone)]
pub struct ResolvedBacklog {
    pub tasks: Vec<Task>,
    pub scripts: HashMap<Uuid, Vec<ScriptedOutcome>>,
    pub review_script: Vec<Vec<Finding>>,
}

/// Load and resolve a backlog file.
///
/// Names must be unique and every `depends_on` entry must name a task in
/// the same file; cycle detection happens later, on submission.
pub fn load(path: impl AsRef<Path>) -> Result<ResolvedBacklog> {
    let raw = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read backlog file {}", path.as_ref().display()))?;
    let file: BacklogFile = serde_yaml::from_str(&raw).context("failed to parse backlog YAML")?;
    resolve(file)
}

/// Resolve a parsed backlog into domain tasks.
pub fn resolve(file: BacklogFile) -> Result<ResolvedBacklog> {
    let mut ids_by_name: HashMap<String, Uuid> = HashMap::new();
    for entry in &file.tasks {
        if ids_by_name
            .insert(entry.name.clone(), Uuid::new_v4())
            .is_some()
        {
            bail!("duplicate task name in backlog: {}", entry.name);
        }
    }

    let mut tasks = Vec::with_capacity(file.tasks.len());
    let mut scripts = HashMap::new();
    for entry in file.tasks {
        let mut task = Task::new(entry.description);
        task.id = ids_by_name[&entry.name];
        task.title = entry.name.clone();
        task.acceptance_criteria = entry.acceptance_criteria;
        if let Some(priority) = entry.priority {
            task.priority = priority;
        }
        task.architecturally_complex = entry.architecturally_complex;
        for dep_name in &entry.depends_on {
            let dep_id = *ids_by_name
                .get(dep_name)
                .with_context(|| format!("task '{}' depends on unknown task '{dep_name}'", entry.name))?;
            task = task.with_dependency(dep_id);
        }
        if !entry.script.is_empty() {
            scripts.insert(task.id, entry.script);
        }
        tasks.push(task);
    }

    Ok(ResolvedBacklog {
        tasks,
        scripts,
        review_script: file.review_script,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_wires_dependencies_by_name() {
        let file: BacklogFile = serde_yaml::from_str(
            r"
tasks:
  - name: schema
    description: Design the schema
  - name: api
    description: Build the API
    depends_on: [schema]
",
        )
        .unwrap();

        let resolved = resolve(file).unwrap();
        assert_eq!(resolved.tasks.len(), 2);
        let schema_id = resolved.tasks[0].id;
        assert_eq!(resolved.tasks[1].depends_on, vec![schema_id]);
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let file: BacklogFile = serde_yaml::from_str(
            r"
tasks:
  - name: api
    description: Build the API
    depends_on: [missing]
",
        )
        .unwrap();
        assert!(resolve(file).is_err());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let file: BacklogFile = serde_yaml::from_str(
            r"
tasks:
  - name: api
    description: one
  - name: api
    description: two
",
        )
        .unwrap();
        assert!(resolve(file).is_err());
    }

    #[test]
    fn test_scripts_are_parsed() {
        let file: BacklogFile = serde_yaml::from_str(
            r"
tasks:
  - name: parser
    description: Write the parser
    script:
      - verification: fail
        confidence: 40
      - verification: pass
        confidence: 90
",
        )
        .unwrap();

        let resolved = resolve(file).unwrap();
        let script = &resolved.scripts[&resolved.tasks[0].id];
        assert_eq!(script.len(), 2);
        assert_eq!(script[0].confidence, 40);
    }
}
