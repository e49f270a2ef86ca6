// src/run/report.rs

//! User-facing diagnostics.
//!
//! Formatting is pure ([`format_diagnostic`], [`paint`]); writing goes through
//! an injected [`Reporter`] so no code path touches terminal state directly.

use std::io::{IsTerminal, Write};

/// Something the user should be told about a build or a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The build collaborator reported a failure.
    CompilationFailed,
    /// More than one retained entry point; `chosen` is used.
    SeveralEntryPoints {
        chosen: String,
        candidates: Vec<String>,
    },
    /// The program exited with a nonzero status.
    NonZeroExit(i32),
    /// The program could not be launched at all.
    LaunchFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::SeveralEntryPoints { .. } => Severity::Warning,
            Diagnostic::CompilationFailed
            | Diagnostic::NonZeroExit(_)
            | Diagnostic::LaunchFailed(_) => Severity::Error,
        }
    }
}

/// Render a diagnostic as a single line of plain text.
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::CompilationFailed => "Compilation failed".to_string(),
        Diagnostic::SeveralEntryPoints { chosen, candidates } => format!(
            "Found several main classes: {}; running {chosen}",
            candidates.join(", ")
        ),
        Diagnostic::NonZeroExit(code) => format!("Program exited with return code {code}."),
        Diagnostic::LaunchFailed(reason) => format!("Could not launch program: {reason}"),
    }
}

/// Wrap `text` in the ANSI color for `severity`.
pub fn paint(severity: Severity, text: &str) -> String {
    let color = match severity {
        Severity::Warning => "33",
        Severity::Error => "31",
    };
    format!("\x1b[{color}m{text}\x1b[0m")
}

/// Sink for diagnostics.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Writes diagnostics to stderr, colored when stderr is a terminal.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            color: std::io::stderr().is_terminal(),
        }
    }

    pub fn with_color(color: bool) -> Self {
        Self { color }
    }

    /// The exact line `report` writes, without the trailing newline.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let text = format_diagnostic(diagnostic);
        if self.color {
            paint(diagnostic.severity(), &text)
        } else {
            text
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        let line = self.render(diagnostic);
        let mut stderr = std::io::stderr().lock();
        // Nowhere left to report a failing stderr.
        let _ = writeln!(stderr, "{line}");
    }
}
