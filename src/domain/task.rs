//! Task records tracked by the fork registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of fork spawned in the new terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForkType {
    /// Claude Code session
    Claude,
    /// Gemini CLI session
    Gemini,
    /// Arbitrary raw CLI command
    #[default]
    Raw,
}

impl ForkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForkType::Claude => "claude",
            ForkType::Gemini => "gemini",
            ForkType::Raw => "raw",
        }
    }

    /// Whether this fork type drives an AI agent (and therefore carries a model)
    pub fn is_agent(&self) -> bool {
        !matches!(self, ForkType::Raw)
    }
}

impl fmt::Display for ForkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a forked task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The forked terminal was spawned and the task has not reported back
    Running,
    /// The task finished successfully
    Completed,
    /// The task finished with an error
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// A terminal status ends the task's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single forked task as persisted in the registry document.
///
/// Field names mirror the on-disk JSON so existing registries keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Opaque short token identifying the task
    pub id: String,

    /// Task description (or the raw command for `raw` forks)
    pub task: String,

    /// Kind of fork that was spawned
    #[serde(rename = "type")]
    pub fork_type: ForkType,

    /// Model tier name for agent forks
    pub model: Option<String>,

    /// Working directory the fork was launched in
    pub cwd: String,

    /// Output capture log, when enabled
    pub output_file: Option<String>,

    /// Context handoff file passed to the agent
    pub context_file: Option<String>,

    /// Preset name if the fork came from a preset
    pub preset: Option<String>,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// When the fork was dispatched
    pub started_at: DateTime<Utc>,

    /// Set exactly once, on the first transition into a terminal status
    pub completed_at: Option<DateTime<Utc>>,

    /// Exit code reported back by the caller, if any
    pub exit_code: Option<i32>,

    /// Free-form notes
    pub notes: Option<String>,
}
