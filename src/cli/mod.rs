//! CLI command implementations
//!
//! Every command prints a single pretty-printed JSON object on stdout for
//! the orchestrating agent to parse, and maps failure onto exit code 1.

pub mod fork;
pub mod task;
pub mod worktree;

/// Print a result object for agent consumption
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Exit code for a result object: 1 when it carries `success: false`
pub fn exit_code_for(value: &serde_json::Value) -> i32 {
    match value.get("success") {
        Some(serde_json::Value::Bool(false)) => 1,
        _ => 0,
    }
}
