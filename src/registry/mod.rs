//! Persistent registry of forked tasks
//!
//! The registry is a single JSON document. Every mutation is a full
//! read-modify-write guarded by an advisory file lock and written via a
//! temp file plus atomic rename, so concurrent invocations cannot tear the
//! document or silently drop each other's updates. The on-disk shape is
//! kept stable: `{tasks: [...], metadata: {created, updated, version}}`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{ForkType, TaskRecord, TaskStatus};
use crate::paths;

/// Schema version written into new registry documents
const REGISTRY_VERSION: &str = "1.0";

/// Update/remove/get against an unknown task id
#[derive(Debug, Error)]
#[error("Task {id} not found")]
pub struct TaskNotFound {
    pub id: String,
}

/// Registry document metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub created: DateTime<Utc>,
    /// Refreshed on every save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    pub version: String,
}

/// The aggregate root: an ordered sequence of task records plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    pub tasks: Vec<TaskRecord>,
    pub metadata: RegistryMetadata,
}

impl Registry {
    fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            metadata: RegistryMetadata {
                created: Utc::now(),
                updated: None,
                version: REGISTRY_VERSION.to_string(),
            },
        }
    }
}

/// Fields for a new task entry
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub id: Option<String>,
    pub task: String,
    pub fork_type: ForkType,
    pub model: Option<String>,
    pub cwd: String,
    pub output_file: Option<String>,
    pub context_file: Option<String>,
    pub preset: Option<String>,
}

/// Fields applied by an update; unset fields leave the record untouched
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub exit_code: Option<i32>,
    pub notes: Option<String>,
}

/// Outcome of a `clear` operation
#[derive(Debug, Clone, Serialize)]
pub struct ClearOutcome {
    pub removed_count: usize,
    pub remaining_count: usize,
    pub cleared_status: String,
}

/// Summary of the registry grouped by status
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub summary: StatusCounts,
    pub running_tasks: Vec<TaskRecord>,
    pub recent_completed: Vec<TaskRecord>,
    pub recent_failed: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Data-access wrapper around the registry document.
///
/// All reads and writes go through this type; callers never touch the file
/// directly.
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the fixed, configuration-free default path
    pub fn open_default() -> Self {
        Self::new(paths::registry_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a new task in `running` state and persist the document.
    ///
    /// Rejects an explicit id that already exists; task ids are unique
    /// within the document.
    pub fn add(&self, new: NewTask) -> Result<TaskRecord> {
        self.mutate(|registry| {
            let id = match new.id.clone() {
                Some(id) => {
                    if registry.tasks.iter().any(|t| t.id == id) {
                        bail!("Task {} already exists", id);
                    }
                    id
                }
                None => paths::generate_task_id(),
            };

            let record = TaskRecord {
                id,
                task: new.task.clone(),
                fork_type: new.fork_type,
                model: new.model.clone(),
                cwd: new.cwd.clone(),
                output_file: new.output_file.clone(),
                context_file: new.context_file.clone(),
                preset: new.preset.clone(),
                status: TaskStatus::Running,
                started_at: Utc::now(),
                completed_at: None,
                exit_code: None,
                notes: None,
            };

            registry.tasks.push(record.clone());
            Ok(record)
        })
    }

    /// Apply an update to the task with the given id.
    ///
    /// `completed_at` is set exactly once, the first time the status
    /// transitions into a terminal state; re-updating an already-terminal
    /// record never erases it.
    pub fn update(&self, id: &str, update: TaskUpdate) -> Result<TaskRecord> {
        self.mutate(|registry| {
            let record = registry
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| TaskNotFound { id: id.to_string() })?;

            if let Some(status) = update.status {
                record.status = status;
                if status.is_terminal() && record.completed_at.is_none() {
                    record.completed_at = Some(Utc::now());
                }
            }
            if let Some(exit_code) = update.exit_code {
                record.exit_code = Some(exit_code);
            }
            if let Some(notes) = update.notes.clone() {
                record.notes = Some(notes);
            }

            Ok(record.clone())
        })
    }

    /// Look up a single task by id
    pub fn get(&self, id: &str) -> Result<TaskRecord> {
        self.load()
            .tasks
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskNotFound { id: id.to_string() }.into())
    }

    /// List tasks, optionally filtered by status, most recently started
    /// first. Returns the page capped at `limit` together with the total
    /// number of matching tasks, which can exceed the page.
    pub fn list(&self, filter: Option<TaskStatus>, limit: usize) -> (Vec<TaskRecord>, usize) {
        let mut tasks = self.load().tasks;
        if let Some(status) = filter {
            tasks.retain(|t| t.status == status);
        }
        let total = tasks.len();
        tasks.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        tasks.truncate(limit);
        (tasks, total)
    }

    /// Total number of records on disk (no filter)
    pub fn count(&self) -> usize {
        self.load().tasks.len()
    }

    /// Remove a single task by id
    pub fn remove(&self, id: &str) -> Result<()> {
        self.mutate(|registry| {
            let before = registry.tasks.len();
            registry.tasks.retain(|t| t.id != id);
            if registry.tasks.len() == before {
                return Err(TaskNotFound { id: id.to_string() }.into());
            }
            Ok(())
        })
    }

    /// Bulk-delete by status. `None` clears completed tasks only;
    /// `Some(None)` means "all".
    pub fn clear(&self, status: Option<Option<TaskStatus>>) -> Result<ClearOutcome> {
        self.mutate(|registry| {
            let before = registry.tasks.len();
            let cleared = match status {
                Some(None) => {
                    registry.tasks.clear();
                    "all".to_string()
                }
                Some(Some(target)) => {
                    registry.tasks.retain(|t| t.status != target);
                    target.as_str().to_string()
                }
                None => {
                    registry.tasks.retain(|t| t.status != TaskStatus::Completed);
                    TaskStatus::Completed.as_str().to_string()
                }
            };

            Ok(ClearOutcome {
                removed_count: before - registry.tasks.len(),
                remaining_count: registry.tasks.len(),
                cleared_status: cleared,
            })
        })
    }

    /// Summary counts plus the most recent tasks per status
    pub fn status_summary(&self) -> StatusSummary {
        let tasks = self.load().tasks;

        let mut running: Vec<_> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .cloned()
            .collect();
        let mut completed: Vec<_> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .cloned()
            .collect();
        let mut failed: Vec<_> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .cloned()
            .collect();

        running.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        failed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        running.truncate(10);
        completed.truncate(5);
        failed.truncate(5);

        StatusSummary {
            summary: StatusCounts {
                total: tasks.len(),
                running: tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Running)
                    .count(),
                completed: tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Completed)
                    .count(),
                failed: tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Failed)
                    .count(),
            },
            running_tasks: running,
            recent_completed: completed,
            recent_failed: failed,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Persistence
    // ═══════════════════════════════════════════════════════════════════

    /// Load the document. A missing or corrupt file is treated as an empty
    /// registry, reinitialized on the next write.
    fn load(&self) -> Registry {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Registry::empty(),
        };

        match serde_json::from_str(&content) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(
                    "Registry at {} is corrupt ({}); starting fresh",
                    self.path.display(),
                    e
                );
                Registry::empty()
            }
        }
    }

    /// Run a read-modify-write under the advisory lock.
    ///
    /// The mutation is persisted only when the closure succeeds; the lock
    /// is released when the lock file handle drops.
    fn mutate<T>(&self, f: impl FnOnce(&mut Registry) -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create registry directory: {}", parent.display())
            })?;
        }

        let lock_path = self.path.with_extension("json.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

        lock_file
            .lock_exclusive()
            .context("Failed to acquire registry lock")?;

        let mut registry = self.load();
        let outcome = f(&mut registry)?;
        self.save(&mut registry)?;

        Ok(outcome)
    }

    /// Write the document via temp file + atomic rename
    fn save(&self, registry: &mut Registry) -> Result<()> {
        registry.metadata.updated = Some(Utc::now());

        let content = serde_json::to_string_pretty(registry)
            .context("Failed to serialize registry")?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        temp_file
            .write_all(content.as_bytes())
            .context("Failed to write registry content")?;

        temp_file.sync_all().context("Failed to sync registry file")?;

        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename registry file: {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, TaskStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = TaskStore::new(dir.path().join("forked-tasks.json"));
        (dir, store)
    }

    fn new_task(task: &str) -> NewTask {
        NewTask {
            task: task.to_string(),
            fork_type: ForkType::Claude,
            cwd: "/tmp".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_then_get() {
        let (_dir, store) = test_store();

        let record = store.add(new_task("fix auth bug")).unwrap();
        assert_eq!(record.status, TaskStatus::Running);
        assert!(record.completed_at.is_none());

        let fetched = store.get(&record.id).unwrap();
        assert_eq!(fetched.task, "fix auth bug");
        assert_eq!(fetched.status, TaskStatus::Running);
    }

    #[test]
    fn test_update_sets_completed_at_once() {
        let (_dir, store) = test_store();
        let record = store.add(new_task("t")).unwrap();

        let updated = store
            .update(
                &record.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        let first_completed = updated.completed_at.expect("completed_at set");
        assert_eq!(updated.started_at, record.started_at);

        // A second terminal update must not move the completion time
        let again = store
            .update(
                &record.id,
                TaskUpdate {
                    status: Some(TaskStatus::Failed),
                    exit_code: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(again.completed_at, Some(first_completed));
        assert_eq!(again.exit_code, Some(1));
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let (_dir, store) = test_store();
        let err = store.update("nope1234", TaskUpdate::default()).unwrap_err();
        assert!(err.downcast_ref::<TaskNotFound>().is_some());
    }

    #[test]
    fn test_duplicate_explicit_id_rejected() {
        let (_dir, store) = test_store();
        let mut task = new_task("a");
        task.id = Some("fixed001".to_string());
        store.add(task.clone()).unwrap();
        assert!(store.add(task).is_err());
    }

    #[test]
    fn test_list_filter_limit_and_ordering() {
        let (_dir, store) = test_store();
        let a = store.add(new_task("first")).unwrap();
        let b = store.add(new_task("second")).unwrap();
        let c = store.add(new_task("third")).unwrap();
        store
            .update(
                &a.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();

        let (running, running_total) = store.list(Some(TaskStatus::Running), 1);
        assert_eq!(running.len(), 1);
        assert_eq!(running_total, 2);
        // Most recently started first
        assert_eq!(running[0].id, c.id);

        let (all, total) = store.list(None, 50);
        assert_eq!(all.len(), 3);
        assert_eq!(total, 3);
        assert_eq!(all.last().unwrap().id, a.id);
        let _ = b;
    }

    #[test]
    fn test_list_total_counts_beyond_the_page() {
        let (_dir, store) = test_store();
        for i in 0..5 {
            store.add(new_task(&format!("task {}", i))).unwrap();
        }

        let (page, total) = store.list(None, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(total, 5);
    }

    #[test]
    fn test_clear_completed_only_by_default() {
        let (_dir, store) = test_store();
        let a = store.add(new_task("a")).unwrap();
        let b = store.add(new_task("b")).unwrap();
        store.add(new_task("c")).unwrap();
        store
            .update(
                &a.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .update(
                &b.id,
                TaskUpdate {
                    status: Some(TaskStatus::Failed),
                    ..Default::default()
                },
            )
            .unwrap();

        let outcome = store.clear(None).unwrap();
        assert_eq!(outcome.removed_count, 1);
        assert_eq!(outcome.remaining_count, 2);
        assert_eq!(outcome.cleared_status, "completed");
        assert_eq!(outcome.removed_count + outcome.remaining_count, 3);

        let outcome = store.clear(Some(None)).unwrap();
        assert_eq!(outcome.removed_count, 2);
        assert_eq!(outcome.cleared_status, "all");
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_corrupt_file_recovers_as_empty() {
        let (_dir, store) = test_store();
        fs::write(store.path(), "{not json at all").unwrap();

        assert_eq!(store.count(), 0);
        // First write reinitializes the document
        store.add(new_task("fresh")).unwrap();
        assert_eq!(store.count(), 1);

        let content = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["metadata"]["version"], "1.0");
        assert!(value["metadata"]["updated"].is_string());
    }

    #[test]
    fn test_status_summary_counts() {
        let (_dir, store) = test_store();
        let a = store.add(new_task("a")).unwrap();
        store.add(new_task("b")).unwrap();
        store
            .update(
                &a.id,
                TaskUpdate {
                    status: Some(TaskStatus::Failed),
                    ..Default::default()
                },
            )
            .unwrap();

        let summary = store.status_summary();
        assert_eq!(summary.summary.total, 2);
        assert_eq!(summary.summary.running, 1);
        assert_eq!(summary.summary.failed, 1);
        assert_eq!(summary.recent_failed.len(), 1);
        assert!(summary.recent_completed.is_empty());
    }
}
