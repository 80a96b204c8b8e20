//! Git worktree manager
//!
//! Worktrees let a forked agent work on its own branch in a separate
//! directory while the main checkout stays untouched. They are created
//! under a sibling directory named `{repo-name}-worktrees` next to the
//! main repository.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of creating a worktree
#[derive(Debug, Clone, Serialize)]
pub struct WorktreeInfo {
    /// Path to the created worktree
    pub worktree_path: String,
    /// Branch checked out in the worktree
    pub branch: String,
    /// Root of the main repository
    pub git_root: String,
    pub created_at: DateTime<Utc>,
}

/// One entry from `git worktree list --porcelain`
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorktreeEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bare: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub detached: bool,
}

/// Manages git worktrees for a repository
pub struct WorktreeManager {
    root: PathBuf,
}

impl WorktreeManager {
    /// Discover the enclosing repository from a working directory
    pub fn discover(cwd: &Path) -> Result<Self> {
        let (success, stdout, _) = run_git(&["rev-parse", "--show-toplevel"], cwd)?;
        if !success {
            bail!("Not in a git repository");
        }
        Ok(Self {
            root: PathBuf::from(stdout),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sibling directory holding all worktrees for this repo
    fn worktrees_dir(&self) -> PathBuf {
        let repo_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "repo".to_string());
        self.root
            .parent()
            .unwrap_or(&self.root)
            .join(format!("{}-worktrees", repo_name))
    }

    fn branch_exists(&self, branch: &str) -> bool {
        run_git(
            &["show-ref", "--verify", &format!("refs/heads/{}", branch)],
            &self.root,
        )
        .map(|(success, _, _)| success)
        .unwrap_or(false)
    }

    /// Create a worktree for `branch`, reusing the branch if it already
    /// exists and creating it otherwise.
    pub fn create(&self, branch: &str) -> Result<WorktreeInfo> {
        let worktrees_dir = self.worktrees_dir();
        std::fs::create_dir_all(&worktrees_dir).with_context(|| {
            format!(
                "Failed to create worktrees directory: {}",
                worktrees_dir.display()
            )
        })?;

        let timestamp = Local::now().format("%Y%m%d-%H%M%S");
        let safe_branch = branch.replace(['/', ' '], "-");
        let worktree_path = worktrees_dir.join(format!("{}-{}", safe_branch, timestamp));
        let worktree_str = worktree_path.display().to_string();

        let args: Vec<&str> = if self.branch_exists(branch) {
            vec!["worktree", "add", &worktree_str, branch]
        } else {
            vec!["worktree", "add", "-b", branch, &worktree_str]
        };

        let (success, _, stderr) = run_git(&args, &self.root)?;
        if !success {
            bail!(
                "{}",
                if stderr.is_empty() {
                    "Failed to create worktree".to_string()
                } else {
                    stderr
                }
            );
        }

        Ok(WorktreeInfo {
            worktree_path: worktree_str,
            branch: branch.to_string(),
            git_root: self.root.display().to_string(),
            created_at: Utc::now(),
        })
    }

    /// List all worktrees, parsed from porcelain output
    pub fn list(&self) -> Result<Vec<WorktreeEntry>> {
        let (success, stdout, stderr) = run_git(&["worktree", "list", "--porcelain"], &self.root)?;
        if !success {
            bail!("{}", stderr);
        }

        let mut worktrees = Vec::new();
        let mut current: Option<WorktreeEntry> = None;

        for line in stdout.lines() {
            if let Some(path) = line.strip_prefix("worktree ") {
                if let Some(entry) = current.take() {
                    worktrees.push(entry);
                }
                current = Some(WorktreeEntry {
                    path: path.to_string(),
                    ..Default::default()
                });
            } else if let Some(entry) = current.as_mut() {
                if let Some(head) = line.strip_prefix("HEAD ") {
                    entry.head = Some(head.to_string());
                } else if let Some(branch) = line.strip_prefix("branch ") {
                    entry.branch = Some(branch.replace("refs/heads/", ""));
                } else if line == "bare" {
                    entry.bare = true;
                } else if line == "detached" {
                    entry.detached = true;
                }
            }
        }
        if let Some(entry) = current.take() {
            worktrees.push(entry);
        }

        Ok(worktrees)
    }

    /// Remove a worktree. `force` discards uncommitted changes.
    pub fn remove(&self, worktree_path: &str, force: bool) -> Result<()> {
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(worktree_path);

        let (success, _, stderr) = run_git(&args, &self.root)?;
        if !success {
            bail!(
                "{}",
                if stderr.is_empty() {
                    "Failed to remove worktree".to_string()
                } else {
                    stderr
                }
            );
        }
        Ok(())
    }

    /// Drop registry entries for worktrees that no longer exist on disk
    pub fn prune(&self) -> Result<()> {
        let (success, _, stderr) = run_git(&["worktree", "prune"], &self.root)?;
        if !success {
            bail!(
                "{}",
                if stderr.is_empty() {
                    "Failed to prune worktrees".to_string()
                } else {
                    stderr
                }
            );
        }
        Ok(())
    }
}

/// Run a git command, returning (success, stdout, stderr) with trimmed text
fn run_git(args: &[&str], cwd: &Path) -> Result<(bool, String, String)> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .context("Failed to run git")?;

    Ok((
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
        String::from_utf8_lossy(&output.stderr).trim().to_string(),
    ))
}
