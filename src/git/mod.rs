//! Git worktree management for isolated fork environments

mod worktree;

pub use worktree::{WorktreeEntry, WorktreeInfo, WorktreeManager};
