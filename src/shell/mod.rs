//! Shell escaping for the dialects a fork can land in
//!
//! Each target shell has its own quoting rules, and a task description is
//! attacker-adjacent input: it must never terminate the quoted region it is
//! embedded in or inject a new command. One pure function per dialect.

/// The quoting/escaping rules of a target shell or scripting language.
///
/// The set is closed: every terminal kind maps to exactly one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellDialect {
    /// POSIX shells (bash, zsh)
    Posix,
    /// cmd.exe
    Cmd,
    /// Windows PowerShell
    PowerShell,
    /// AppleScript string literals (drives Terminal.app via osascript)
    AppleScript,
}

impl ShellDialect {
    /// Escape `text` so it can be embedded in this dialect's quoting context
    /// and parse back to the original text verbatim.
    pub fn escape(&self, text: &str) -> String {
        match self {
            ShellDialect::Posix => escape_posix(text),
            ShellDialect::Cmd => escape_cmd(text),
            ShellDialect::PowerShell => escape_powershell(text),
            ShellDialect::AppleScript => escape_applescript(text),
        }
    }
}

/// Escape for POSIX shells.
///
/// Single quotes become the close-escape-reopen sequence `'\''`; double
/// quotes are additionally backslash-escaped for double-quoted contexts.
fn escape_posix(text: &str) -> String {
    text.replace('\'', "'\\''").replace('"', "\\\"")
}

/// Escape for cmd.exe.
///
/// Percent signs are doubled so they are not expanded as environment
/// variables.
fn escape_cmd(text: &str) -> String {
    text.replace('"', "\\\"").replace('%', "%%")
}

/// Escape for PowerShell.
///
/// Single quotes are doubled before backticks so a backtick introduced by
/// the quote step cannot be re-read as an escape character. Double quotes
/// are backslash-escaped: the composed command is embedded in a
/// double-quoted region, and a bare `"` would terminate it.
fn escape_powershell(text: &str) -> String {
    text.replace('\'', "''")
        .replace('`', "``")
        .replace('"', "\\\"")
}

/// Escape for AppleScript string literals.
///
/// Backslashes are escaped before quotes so the backslash added by the
/// quote step is not escaped a second time.
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Wrap `text` in single quotes for a POSIX shell, escaping as needed
pub fn posix_single_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse a POSIX single-quoted word back to its raw text, the way a
    /// shell tokenizer would.
    fn unquote_posix(quoted: &str) -> String {
        assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
        let inner = &quoted[1..quoted.len() - 1];
        inner.replace("'\\''", "'")
    }

    #[test]
    fn test_posix_single_quote_round_trip() {
        for text in ["hello", "it's", "a'b'c", "", "don't; rm -rf /"] {
            assert_eq!(unquote_posix(&posix_single_quote(text)), text);
        }
    }

    #[test]
    fn test_posix_escape() {
        assert_eq!(ShellDialect::Posix.escape("it's"), "it'\\''s");
        assert_eq!(ShellDialect::Posix.escape("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn test_cmd_escape() {
        assert_eq!(ShellDialect::Cmd.escape("100%"), "100%%");
        assert_eq!(ShellDialect::Cmd.escape("say \"hi\""), "say \\\"hi\\\"");
        // %PATH% must not survive as an expandable variable
        assert_eq!(ShellDialect::Cmd.escape("%PATH%"), "%%PATH%%");
    }

    #[test]
    fn test_powershell_escape() {
        assert_eq!(ShellDialect::PowerShell.escape("it's"), "it''s");
        assert_eq!(ShellDialect::PowerShell.escape("a`b"), "a``b");
        assert_eq!(ShellDialect::PowerShell.escape("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn test_powershell_double_quote_cannot_close_quoted_region() {
        // Every interior double quote must come out backslash-escaped, so
        // text like `"; Remove-Item x; echo "` cannot terminate the quoted
        // region it is embedded in and run as a new statement.
        let escaped = ShellDialect::PowerShell.escape("say \"; Remove-Item x; echo \"done");
        assert_eq!(escaped, "say \\\"; Remove-Item x; echo \\\"done");
        let mut prev = ' ';
        for c in escaped.chars() {
            if c == '"' {
                assert_eq!(prev, '\\');
            }
            prev = c;
        }
    }

    #[test]
    fn test_powershell_escape_quote_and_backtick_together() {
        // Pins the transform ordering: quotes are doubled first, then
        // backticks. The doubled quote never gains a stray backtick.
        assert_eq!(ShellDialect::PowerShell.escape("it's `x`"), "it''s ``x``");
        assert_eq!(ShellDialect::PowerShell.escape("`'"), "``''");
    }

    #[test]
    fn test_powershell_single_quoted_round_trip() {
        // Inside a single-quoted PowerShell string only '' is special;
        // undoing the doubling must restore the original text.
        for text in ["it's", "a'b'c", "tick ` and quote '", ""] {
            let escaped = ShellDialect::PowerShell.escape(text);
            let parsed = escaped.replace("''", "'").replace("``", "`");
            assert_eq!(parsed, text);
        }
    }

    #[test]
    fn test_applescript_escape() {
        assert_eq!(ShellDialect::AppleScript.escape("a\\b"), "a\\\\b");
        assert_eq!(ShellDialect::AppleScript.escape("say \"hi\""), "say \\\"hi\\\"");
        // Backslash-before-quote input: each character escaped exactly once
        assert_eq!(ShellDialect::AppleScript.escape("\\\""), "\\\\\\\"");
    }

    #[test]
    fn test_applescript_round_trip() {
        for text in ["plain", "back\\slash", "quo\"te", "\\\"", ""] {
            let escaped = ShellDialect::AppleScript.escape(text);
            // An AppleScript parser reads \\ as \ and \" as "
            let mut parsed = String::new();
            let mut chars = escaped.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    parsed.push(chars.next().expect("dangling escape"));
                } else {
                    parsed.push(c);
                }
            }
            assert_eq!(parsed, text);
        }
    }

    #[test]
    fn test_empty_string_every_dialect() {
        for dialect in [
            ShellDialect::Posix,
            ShellDialect::Cmd,
            ShellDialect::PowerShell,
            ShellDialect::AppleScript,
        ] {
            assert_eq!(dialect.escape(""), "");
        }
        assert_eq!(posix_single_quote(""), "''");
    }
}
