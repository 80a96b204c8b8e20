//! Fixed on-disk locations and naming for forkterm state
//!
//! Everything lives under `~/.forkterm/`; there is no configuration knob
//! for these paths.

use chrono::Local;
use std::path::PathBuf;

/// Base directory for all forkterm state (`~/.forkterm/`)
pub fn base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".forkterm")
}

/// Directory holding the registry document
pub fn data_dir() -> PathBuf {
    base_dir().join("data")
}

/// The registry document path
pub fn registry_path() -> PathBuf {
    data_dir().join("forked-tasks.json")
}

/// Directory for fork output logs
pub fn logs_dir() -> PathBuf {
    base_dir().join("logs").join("forks")
}

/// Generate a short unique task ID (8 hex chars)
pub fn generate_task_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Build the output log path for a task:
/// `{date}_{slugified-task-prefix}_{task_id}.md` under the logs directory.
pub fn output_log_path(task: &str, task_id: &str) -> PathBuf {
    let date = Local::now().format("%Y-%m-%d");
    logs_dir().join(format!("{}_{}_{}.md", date, slugify(task), task_id))
}

/// Filename-safe slug from the first 30 characters of the task
fn slugify(task: &str) -> String {
    let safe: String = task
        .chars()
        .take(30)
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    safe.trim_matches('-').to_lowercase()
}
