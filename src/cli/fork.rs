//! Fork command implementation

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use forkterm::domain::{ForkType, LaunchIntent};
use forkterm::shell::ShellDialect;
use forkterm::{compose, paths, terminal};

use super::print_json;

/// Spawn a new terminal window running an AI agent or a raw command
#[derive(Debug, Args)]
pub struct ForkArgs {
    /// Type of fork: claude (Claude Code), gemini (Gemini CLI), or raw (CLI command)
    #[arg(long = "type", value_enum)]
    pub fork_type: ForkType,

    /// Task description or command to execute
    #[arg(long)]
    pub task: String,

    /// Model tier for AI agents
    #[arg(long, default_value = "sonnet", value_parser = ["haiku", "sonnet", "opus"])]
    pub model: String,

    /// Working directory for the forked terminal (default: current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Path to a context summary file for handoff
    #[arg(long = "with-context", value_name = "PATH")]
    pub context_file: Option<PathBuf>,

    /// Disable output capture to logs
    #[arg(long)]
    pub no_output: bool,

    /// Add --dangerously-skip-permissions (for trusted automation)
    #[arg(long)]
    pub skip_permissions: bool,

    /// Specific task ID (auto-generated if not provided)
    #[arg(long)]
    pub task_id: Option<String>,

    /// Force opening a new window instead of a tab (Windows Terminal only)
    #[arg(long)]
    pub new_window: bool,
}

/// Compose, resolve and dispatch a fork, then print the result envelope
pub async fn fork_command(args: ForkArgs) -> Result<i32> {
    let cwd = absolutize(args.cwd.clone().unwrap_or_else(|| PathBuf::from(".")));
    let task_id = args
        .task_id
        .clone()
        .unwrap_or_else(paths::generate_task_id);

    let output_file =
        (!args.no_output).then(|| paths::output_log_path(&args.task, &task_id));

    let intent = match args.fork_type {
        ForkType::Claude => LaunchIntent::Claude {
            task: args.task.clone(),
            model: args.model.clone(),
            context_file: args.context_file.clone(),
            skip_permissions: args.skip_permissions,
        },
        ForkType::Gemini => LaunchIntent::Gemini {
            task: args.task.clone(),
            model: Some(args.model.clone()),
        },
        ForkType::Raw => LaunchIntent::Raw {
            command: args.task.clone(),
        },
    };

    // The composer escapes for the shell the command will run inside, so
    // the terminal choice decides the dialect. Dispatch re-probes on its
    // own; installed terminals can change between runs and the probe is
    // cheap.
    let dialect = terminal::resolve()
        .map(|choice| choice.kind.dialect())
        .unwrap_or(ShellDialect::Posix);
    let composed = compose::compose(&intent, dialect);

    let result = terminal::dispatch(
        &composed.command,
        &cwd,
        &composed.title,
        output_file.as_deref(),
        args.new_window,
    );

    let platform = std::env::consts::OS;
    let message = if result.success {
        format!(
            "Forked {} agent spawned successfully on {}",
            args.fork_type.as_str(),
            platform
        )
    } else {
        let detail = result
            .error
            .clone()
            .or_else(|| result.stderr.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "Unknown error".to_string());
        format!("Failed to spawn: {}", detail)
    };

    let envelope = json!({
        "timestamp": Utc::now(),
        "task_id": task_id,
        "fork_type": args.fork_type,
        "task": args.task,
        "model": if args.fork_type.is_agent() { Some(args.model.as_str()) } else { None },
        "cwd": cwd.display().to_string(),
        "platform": platform,
        "command_executed": composed.command,
        "output_file": output_file.as_ref().map(|p| p.display().to_string()),
        "new_window": args.new_window,
        "spawn_result": result,
        "message": message,
    });

    print_json(&envelope);
    Ok(if result_success(&envelope) { 0 } else { 1 })
}

fn result_success(envelope: &serde_json::Value) -> bool {
    envelope["spawn_result"]["success"].as_bool().unwrap_or(false)
}

/// Resolve a working directory to an absolute path without requiring it to
/// exist; a missing directory surfaces as a spawn failure instead.
fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(&path))
            .unwrap_or(path)
    }
}
