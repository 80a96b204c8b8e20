//! Task registry command implementations

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use forkterm::domain::{ForkType, TaskStatus};
use forkterm::registry::{NewTask, TaskStore, TaskUpdate};

use super::{exit_code_for, print_json};

/// Track forked tasks in the persistent registry
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Add a new task in running state
    Add {
        /// Task ID (auto-generated if not provided)
        #[arg(long)]
        id: Option<String>,

        /// Task description
        #[arg(long)]
        task: String,

        /// Type of fork the task belongs to
        #[arg(long = "type", value_enum)]
        fork_type: ForkType,

        /// Working directory
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Model used (for AI agents)
        #[arg(long)]
        model: Option<String>,

        /// Output log file path
        #[arg(long)]
        output_file: Option<String>,

        /// Context handoff file path
        #[arg(long)]
        context_file: Option<String>,

        /// Preset name
        #[arg(long)]
        preset: Option<String>,
    },

    /// Show a status summary of all tasks
    Status,

    /// List tasks, most recently started first
    List {
        /// Only show tasks with this status
        #[arg(long, value_enum)]
        filter: Option<TaskStatus>,

        /// Maximum number of tasks to return
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Get a specific task by ID
    Get {
        #[arg(long)]
        id: String,
    },

    /// Update a task's status, exit code or notes
    Update {
        #[arg(long)]
        id: String,

        #[arg(long, value_enum)]
        status: Option<TaskStatus>,

        #[arg(long)]
        exit_code: Option<i32>,

        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a task from the registry
    Remove {
        #[arg(long)]
        id: String,
    },

    /// Clear tasks by status (default: completed only)
    Clear {
        /// Status to clear
        #[arg(long, value_parser = ["completed", "failed", "all"])]
        status: Option<String>,
    },
}

/// Execute a registry sub-command and print its JSON result
pub async fn task_command(command: TaskCommand) -> Result<i32> {
    let store = TaskStore::open_default();

    let result = match command {
        TaskCommand::Add {
            id,
            task,
            fork_type,
            cwd,
            model,
            output_file,
            context_file,
            preset,
        } => {
            let cwd = cwd
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from("."));
            match store.add(NewTask {
                id,
                task,
                fork_type,
                model,
                cwd: cwd.display().to_string(),
                output_file,
                context_file,
                preset,
            }) {
                Ok(record) => serde_json::to_value(&record)?,
                Err(e) => failure(e),
            }
        }

        TaskCommand::Status => serde_json::to_value(store.status_summary())?,

        TaskCommand::List { filter, limit } => {
            // count reflects every matching task; only the array is capped
            let (tasks, total) = store.list(filter, limit);
            json!({
                "count": total,
                "tasks": tasks,
                "filter": filter.map(|s| s.as_str()),
            })
        }

        TaskCommand::Get { id } => match store.get(&id) {
            Ok(record) => json!({ "success": true, "task": record }),
            Err(e) => failure(e),
        },

        TaskCommand::Update {
            id,
            status,
            exit_code,
            notes,
        } => match store.update(
            &id,
            TaskUpdate {
                status,
                exit_code,
                notes,
            },
        ) {
            Ok(record) => json!({ "success": true, "task": record }),
            Err(e) => failure(e),
        },

        TaskCommand::Remove { id } => match store.remove(&id) {
            Ok(()) => json!({
                "success": true,
                "id": id,
                "message": format!("Task {} removed", id),
            }),
            Err(e) => failure(e),
        },

        TaskCommand::Clear { status } => {
            let scope = match status.as_deref() {
                Some("all") => Some(None),
                Some("completed") => Some(Some(TaskStatus::Completed)),
                Some("failed") => Some(Some(TaskStatus::Failed)),
                _ => None,
            };
            match store.clear(scope) {
                Ok(outcome) => {
                    let mut value = serde_json::to_value(&outcome)?;
                    value["success"] = json!(true);
                    value
                }
                Err(e) => failure(e),
            }
        }
    };

    print_json(&result);
    Ok(exit_code_for(&result))
}

fn failure(error: anyhow::Error) -> serde_json::Value {
    json!({ "success": false, "error": error.to_string() })
}
