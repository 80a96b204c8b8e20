//! Launch intents consumed by the command composer

use std::path::PathBuf;

use super::ForkType;

/// What the caller wants to run in the new terminal.
///
/// Immutable once constructed; consumed by [`crate::compose::compose`].
#[derive(Debug, Clone)]
pub enum LaunchIntent {
    /// Claude Code invocation with model selection, optional context handoff
    /// and optional unattended automation.
    Claude {
        task: String,
        /// Model tier name; an unknown tier emits no `--model` flag
        model: String,
        /// Context file whose contents get prepended to the task
        context_file: Option<PathBuf>,
        /// Append `--dangerously-skip-permissions` for trusted automation
        skip_permissions: bool,
    },

    /// Gemini CLI invocation. The model, if present, is passed through as
    /// free text without validation.
    Gemini { task: String, model: Option<String> },

    /// Arbitrary command, passed through verbatim. The caller owns the
    /// syntax; pipes and redirects must not be mangled.
    Raw { command: String },
}

impl LaunchIntent {
    /// The task description as the caller gave it (used for titles and logs)
    pub fn task_text(&self) -> &str {
        match self {
            LaunchIntent::Claude { task, .. } => task,
            LaunchIntent::Gemini { task, .. } => task,
            LaunchIntent::Raw { command } => command,
        }
    }

    pub fn fork_type(&self) -> ForkType {
        match self {
            LaunchIntent::Claude { .. } => ForkType::Claude,
            LaunchIntent::Gemini { .. } => ForkType::Gemini,
            LaunchIntent::Raw { .. } => ForkType::Raw,
        }
    }
}

/// A fully composed command line plus the window/tab title for it.
///
/// Owned transiently by the dispatch call; never persisted.
#[derive(Debug, Clone)]
pub struct ComposedCommand {
    /// The literal command line to run inside the target shell
    pub command: String,
    /// Display title, already truncated to the preview width
    pub title: String,
}
