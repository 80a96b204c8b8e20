//! Worktree command implementations

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use forkterm::git::WorktreeManager;

use super::{exit_code_for, print_json};

/// Manage isolated git worktrees for forked agents
#[derive(Debug, Subcommand)]
pub enum WorktreeCommand {
    /// Create a new worktree (and branch, if needed)
    Create {
        /// Branch name
        #[arg(long)]
        branch: String,

        /// Task description recorded in the result
        #[arg(long, default_value = "")]
        task: String,

        /// Working directory (must be inside a git repository)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// List all worktrees
    List {
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Remove a worktree
    Remove {
        /// Worktree path
        #[arg(long)]
        path: String,

        /// Force removal even with uncommitted changes
        #[arg(long)]
        force: bool,

        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Prune stale worktree entries
    Prune {
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
}

/// Execute a worktree sub-command and print its JSON result
pub async fn worktree_command(command: WorktreeCommand) -> Result<i32> {
    let result = match command {
        WorktreeCommand::Create { branch, task, cwd } => match manager(cwd) {
            Ok(manager) => match manager.create(&branch) {
                Ok(info) => json!({
                    "success": true,
                    "worktree_path": info.worktree_path,
                    "branch": info.branch,
                    "task": task,
                    "git_root": info.git_root,
                    "created_at": info.created_at,
                    "message": format!("Worktree created at {}", info.worktree_path),
                }),
                Err(e) => failure(e),
            },
            Err(e) => failure(e),
        },

        WorktreeCommand::List { cwd } => match manager(cwd) {
            Ok(manager) => match manager.list() {
                Ok(worktrees) => json!({
                    "success": true,
                    "count": worktrees.len(),
                    "worktrees": worktrees,
                    "git_root": manager.root().display().to_string(),
                }),
                Err(e) => failure(e),
            },
            Err(e) => failure(e),
        },

        WorktreeCommand::Remove { path, force, cwd } => match manager(cwd) {
            Ok(manager) => match manager.remove(&path, force) {
                Ok(()) => json!({
                    "success": true,
                    "removed": path,
                    "message": format!("Worktree {} removed", path),
                }),
                Err(e) => json!({
                    "success": false,
                    "error": e.to_string(),
                    "hint": "Use --force to remove worktrees with uncommitted changes",
                }),
            },
            Err(e) => failure(e),
        },

        WorktreeCommand::Prune { cwd } => match manager(cwd) {
            Ok(manager) => match manager.prune() {
                Ok(()) => json!({
                    "success": true,
                    "message": "Stale worktree entries pruned",
                }),
                Err(e) => failure(e),
            },
            Err(e) => failure(e),
        },
    };

    print_json(&result);
    Ok(exit_code_for(&result))
}

fn manager(cwd: Option<PathBuf>) -> Result<WorktreeManager> {
    let cwd = cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    WorktreeManager::discover(&cwd)
}

fn failure(error: anyhow::Error) -> serde_json::Value {
    json!({ "success": false, "error": error.to_string() })
}
