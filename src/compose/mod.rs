//! Command composition for fork intents
//!
//! Turns an abstract [`LaunchIntent`] into the literal command line that
//! will run inside the target shell, escaped with that shell's dialect.

use std::fs;

use crate::domain::{ComposedCommand, LaunchIntent};
use crate::shell::ShellDialect;

/// Number of task characters shown in the window/tab title
const TITLE_PREVIEW_CHARS: usize = 40;

/// Delimiter between inlined context and the task text
const CONTEXT_DELIMITER: &str = "\n\n---\n\nTask: ";

/// Resolve a model tier name to its concrete model identifier.
///
/// Unknown tiers resolve to `None` and emit no `--model` flag; that is a
/// silent pass, not an error.
pub fn resolve_model_id(tier: &str) -> Option<&'static str> {
    match tier {
        "haiku" => Some("claude-3-5-haiku-20241022"),
        "sonnet" => Some("claude-sonnet-4-20250514"),
        "opus" => Some("claude-opus-4-20250514"),
        _ => None,
    }
}

/// Compose the full command line and title for an intent.
///
/// `dialect` is the escaping dialect of the shell the command will run
/// inside, as decided by the terminal resolver - not necessarily POSIX.
pub fn compose(intent: &LaunchIntent, dialect: ShellDialect) -> ComposedCommand {
    let command = match intent {
        LaunchIntent::Claude {
            task,
            model,
            context_file,
            skip_permissions,
        } => {
            let mut parts = vec!["claude".to_string()];

            if let Some(model_id) = resolve_model_id(model) {
                parts.push("--model".to_string());
                parts.push(model_id.to_string());
            }

            if *skip_permissions {
                parts.push("--dangerously-skip-permissions".to_string());
            }

            // Inline the context file if it is readable; a read failure
            // degrades to the bare task and never fails the composition.
            let mut task_text = task.clone();
            if let Some(path) = context_file {
                if path.exists() {
                    if let Ok(context) = fs::read_to_string(path) {
                        task_text = format!("{}{}{}", context, CONTEXT_DELIMITER, task);
                    }
                }
            }

            parts.push(format!("\"{}\"", dialect.escape(&task_text)));
            parts.join(" ")
        }

        LaunchIntent::Gemini { task, model } => {
            let mut parts = vec!["gemini".to_string()];

            if let Some(model) = model {
                parts.push("--model".to_string());
                parts.push(model.clone());
            }

            parts.push(format!("\"{}\"", dialect.escape(task)));
            parts.join(" ")
        }

        // Raw commands legitimately contain shell operators; pass through
        // with no escaping.
        LaunchIntent::Raw { command } => command.clone(),
    };

    ComposedCommand {
        command,
        title: make_title(intent),
    }
}

/// Build the window/tab title: `"{prefix}: {first 40 chars}..."`.
///
/// The ellipsis is always appended, even when nothing was truncated. That
/// matches the historical output and downstream tooling keys off it.
fn make_title(intent: &LaunchIntent) -> String {
    let prefix = match intent {
        LaunchIntent::Claude { .. } => "Claude",
        LaunchIntent::Gemini { .. } => "Gemini",
        LaunchIntent::Raw { .. } => "CLI",
    };
    let preview: String = intent.task_text().chars().take(TITLE_PREVIEW_CHARS).collect();
    format!("{}: {}...", prefix, preview)
}
