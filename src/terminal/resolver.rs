//! Best-available terminal detection per platform
//!
//! Presence on disk, not configuration, drives the decision: installed
//! terminals can change between runs, so the probe is repeated on every
//! dispatch and nothing is cached.

use anyhow::{bail, Result};
use std::path::Path;

use crate::shell::ShellDialect;

/// The terminal program chosen to host a fork
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Windows Terminal (wt.exe)
    WindowsTerminal,
    /// PowerShell Start-Process fallback
    PowerShell,
    /// macOS Terminal.app driven via osascript
    MacTerminal,
    GnomeTerminal,
    Konsole,
    XfceTerminal,
    Xterm,
}

impl TerminalKind {
    /// Name reported in dispatch results
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalKind::WindowsTerminal => "wt",
            TerminalKind::PowerShell => "powershell",
            TerminalKind::MacTerminal => "Terminal.app",
            TerminalKind::GnomeTerminal => "gnome-terminal",
            TerminalKind::Konsole => "konsole",
            TerminalKind::XfceTerminal => "xfce4-terminal",
            TerminalKind::Xterm => "xterm",
        }
    }

    /// Dialect of the shell the composed command will run inside.
    ///
    /// Both Windows paths nest the command in `powershell -Command`; the
    /// Unix terminals all hand it to a POSIX shell. AppleScript escaping is
    /// an outer layer applied by the macOS dispatcher, not the command's
    /// own dialect.
    pub fn dialect(&self) -> ShellDialect {
        match self {
            TerminalKind::WindowsTerminal | TerminalKind::PowerShell => ShellDialect::PowerShell,
            _ => ShellDialect::Posix,
        }
    }
}

/// A resolved terminal: which kind, and the program to invoke for it
#[derive(Debug, Clone)]
pub struct TerminalChoice {
    pub kind: TerminalKind,
    pub program: String,
}

impl TerminalChoice {
    fn new(kind: TerminalKind, program: impl Into<String>) -> Self {
        Self {
            kind,
            program: program.into(),
        }
    }
}

/// Determine the best available terminal for the current platform.
///
/// Windows: Windows Terminal at its per-user install path, then `wt` on
/// PATH, then PowerShell. macOS: always osascript. Linux: gnome-terminal,
/// konsole, xfce4-terminal, xterm in that order, with xterm returned as a
/// last resort even when nothing was found.
pub fn resolve() -> Result<TerminalChoice> {
    match std::env::consts::OS {
        "windows" => Ok(resolve_windows()),
        "macos" => Ok(TerminalChoice::new(TerminalKind::MacTerminal, "osascript")),
        "linux" => Ok(resolve_linux()),
        other => bail!("Unsupported platform: {}", other),
    }
}

fn resolve_windows() -> TerminalChoice {
    // Standard per-user install location for Windows Terminal
    if let Ok(local_app_data) = std::env::var("LOCALAPPDATA") {
        let wt_path = Path::new(&local_app_data)
            .join("Microsoft")
            .join("WindowsApps")
            .join("wt.exe");
        if wt_path.exists() {
            return TerminalChoice::new(
                TerminalKind::WindowsTerminal,
                wt_path.display().to_string(),
            );
        }
    }

    if which::which("wt").is_ok() {
        return TerminalChoice::new(TerminalKind::WindowsTerminal, "wt");
    }

    // PowerShell is always present on Windows
    TerminalChoice::new(TerminalKind::PowerShell, "powershell")
}

fn resolve_linux() -> TerminalChoice {
    let candidates = [
        (TerminalKind::GnomeTerminal, "gnome-terminal"),
        (TerminalKind::Konsole, "konsole"),
        (TerminalKind::XfceTerminal, "xfce4-terminal"),
        (TerminalKind::Xterm, "xterm"),
    ];

    for (kind, program) in candidates {
        if which::which(program).is_ok() {
            return TerminalChoice::new(kind, program);
        }
    }

    // Last-resort default: the probe degrades, it never fails
    TerminalChoice::new(TerminalKind::Xterm, "xterm")
}
