//! Platform-specific terminal spawning
//!
//! Each supported terminal has its own argument grammar for working
//! directory, title and command execution. Dispatch blocks on the launch
//! call only; the spawned interactive session is fully detached and is
//! never awaited or signalled. A spawn failure is reported in the result,
//! never raised.

use serde::Serialize;
use std::path::Path;
use std::process::Command;

use crate::shell::{posix_single_quote, ShellDialect};

use super::resolver::{resolve, TerminalChoice, TerminalKind};

/// Maximum window/tab title length passed to the terminal program
const TITLE_MAX_CHARS: usize = 50;

/// Outcome of a terminal launch.
///
/// Reports only whether the spawn call itself succeeded, not the outcome of
/// the program running in the new terminal. Keys mirror the JSON emitted to
/// the orchestrating agent.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub terminal_type: Option<String>,
    pub command: String,
    pub cwd: String,
    pub title: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub returncode: Option<i32>,
    pub output_file: Option<String>,
    pub new_window: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    fn failure(
        terminal_type: Option<&TerminalKind>,
        command: &str,
        cwd: &str,
        title: &str,
        new_window: bool,
        error: String,
    ) -> Self {
        Self {
            success: false,
            terminal_type: terminal_type.map(|k| k.as_str().to_string()),
            command: command.to_string(),
            cwd: cwd.to_string(),
            title: title.to_string(),
            stdout: None,
            stderr: None,
            returncode: None,
            output_file: None,
            new_window,
            error: Some(error),
        }
    }
}

/// Spawn a new terminal running `command`, resolving the terminal fresh.
///
/// Never returns an error: every failure mode, including an unsupported
/// platform and a rejected process creation, comes back as a populated
/// result with `success: false`.
pub fn dispatch(
    command: &str,
    cwd: &Path,
    title: &str,
    output_file: Option<&Path>,
    new_window: bool,
) -> DispatchResult {
    let cwd_str = cwd.display().to_string();
    match resolve() {
        Ok(choice) => dispatch_with(&choice, command, cwd, title, output_file, new_window),
        Err(e) => DispatchResult::failure(None, command, &cwd_str, title, new_window, e.to_string()),
    }
}

/// Spawn a new terminal using an already-resolved choice.
pub fn dispatch_with(
    choice: &TerminalChoice,
    command: &str,
    cwd: &Path,
    title: &str,
    output_file: Option<&Path>,
    new_window: bool,
) -> DispatchResult {
    let cwd_str = cwd.display().to_string();
    let title = truncate_chars(title, TITLE_MAX_CHARS);

    // Best-effort duplication of the visible session into the log file.
    // This captures what the operator sees, not a program's raw output.
    let command_with_log = match output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Failed to create log directory: {}", e);
                }
            }
            tee_command(choice.kind, command, path)
        }
        None => command.to_string(),
    };

    let (program, args, launch_cwd) = match choice.kind {
        TerminalKind::WindowsTerminal => (
            choice.program.clone(),
            windows_terminal_args(&cwd_str, &title, &command_with_log, new_window),
            Some(cwd),
        ),
        TerminalKind::PowerShell => (
            choice.program.clone(),
            powershell_fallback_args(&cwd_str, &command_with_log),
            Some(cwd),
        ),
        // Terminal.app positions itself; the launch call needs no cwd
        TerminalKind::MacTerminal => (
            choice.program.clone(),
            vec![
                "-e".to_string(),
                applescript_source(&cwd_str, &command_with_log),
            ],
            None,
        ),
        kind => (
            choice.program.clone(),
            linux_args(kind, &cwd_str, &title, &command_with_log),
            Some(cwd),
        ),
    };

    let mut launch = Command::new(&program);
    launch.args(&args);
    if let Some(dir) = launch_cwd {
        launch.current_dir(dir);
    }

    tracing::debug!("Launching {} via {}", choice.kind.as_str(), program);

    match launch.output() {
        Ok(output) => DispatchResult {
            success: output.status.success(),
            terminal_type: Some(choice.kind.as_str().to_string()),
            command: command.to_string(),
            cwd: cwd_str,
            title,
            stdout: Some(String::from_utf8_lossy(&output.stdout).to_string()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            returncode: output.status.code(),
            output_file: output_file.map(|p| p.display().to_string()),
            new_window,
            error: None,
        },
        Err(e) => DispatchResult::failure(
            Some(&choice.kind),
            command,
            &cwd_str,
            &title,
            new_window,
            e.to_string(),
        ),
    }
}

/// Append the target shell's native tee so the visible session is also
/// written to `path`.
fn tee_command(kind: TerminalKind, command: &str, path: &Path) -> String {
    match kind.dialect() {
        ShellDialect::PowerShell => format!(
            "{} 2>&1 | Tee-Object -FilePath \"{}\"",
            command,
            path.display()
        ),
        _ => format!("{} 2>&1 | tee \"{}\"", command, path.display()),
    }
}

/// Windows Terminal: a new tab (or, when forced, a new window via `-w -1`)
/// carrying working directory, title and a nested interactive PowerShell.
fn windows_terminal_args(cwd: &str, title: &str, command: &str, new_window: bool) -> Vec<String> {
    let mut args = Vec::new();
    if new_window {
        args.push("-w".to_string());
        args.push("-1".to_string());
    }
    args.extend(
        [
            "new-tab",
            "-d",
            cwd,
            "--title",
            title,
            "powershell",
            "-NoExit",
            "-Command",
            command,
        ]
        .map(String::from),
    );
    args
}

/// PowerShell fallback: `Start-Process` opens the new window, and because
/// the outer invocation is itself PowerShell, the inner script is escaped
/// twice with the same dialect to survive both levels of parsing.
fn powershell_fallback_args(cwd: &str, command: &str) -> Vec<String> {
    let ps = ShellDialect::PowerShell;
    let script = format!("Set-Location '{}'; {}", ps.escape(cwd), ps.escape(command));
    vec![
        "-Command".to_string(),
        format!(
            "Start-Process powershell -ArgumentList '-NoExit', '-Command', '{}'",
            ps.escape(&script)
        ),
    ]
}

/// AppleScript that activates Terminal.app and runs a shell line which
/// changes directory first. Only the outer AppleScript layer is escaped;
/// the inner shell fragment is not independently re-escaped.
fn applescript_source(cwd: &str, command: &str) -> String {
    let escaped_cwd = ShellDialect::AppleScript.escape(cwd);
    let escaped_cmd = ShellDialect::AppleScript.escape(command);
    format!(
        "tell application \"Terminal\"\n\tactivate\n\tdo script \"cd \\\"{}\\\" && {}\"\nend tell",
        escaped_cwd, escaped_cmd
    )
}

/// Per-emulator argument grammar on Linux.
///
/// gnome-terminal and konsole take the inner shell as separate argv tokens;
/// xfce4-terminal and xterm have no array-style execute flag, so the inner
/// invocation is a single pre-escaped string.
fn linux_args(kind: TerminalKind, cwd: &str, title: &str, command: &str) -> Vec<String> {
    match kind {
        TerminalKind::GnomeTerminal => {
            let inner = format!("{}; exec bash", command);
            [
                "--working-directory",
                cwd,
                "--title",
                title,
                "--",
                "bash",
                "-c",
                inner.as_str(),
            ]
            .map(String::from)
            .to_vec()
        }

        TerminalKind::Konsole => {
            let inner = format!("{}; exec bash", command);
            ["--workdir", cwd, "-e", "bash", "-c", inner.as_str()]
                .map(String::from)
                .to_vec()
        }

        TerminalKind::XfceTerminal => {
            let escaped = ShellDialect::Posix.escape(command);
            let inner = format!("bash -c \"{}; exec bash\"", escaped);
            [
                "--working-directory",
                cwd,
                "--title",
                title,
                "-e",
                inner.as_str(),
            ]
            .map(String::from)
            .to_vec()
        }

        _ => {
            // xterm fallback; cwd is single-quoted so a spaced path cannot
            // break the cd out of the inner invocation
            let escaped = ShellDialect::Posix.escape(command);
            let inner = format!(
                "bash -c \"cd {} && {}; exec bash\"",
                posix_single_quote(cwd),
                escaped
            );
            ["-T", title, "-e", inner.as_str()].map(String::from).to_vec()
        }
    }
}

/// Truncate at a character boundary, never mid-codepoint
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
