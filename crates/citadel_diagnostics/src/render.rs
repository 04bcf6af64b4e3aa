//! Rendering of diagnostics for terminal output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering a diagnostic into a formatted string.
///
/// The terminal renderer below is the human-readable backend; machine
/// consumers serialize [`Diagnostic`] values directly instead.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a compact two-line terminal format.
///
/// Produces output like:
/// ```text
/// error: expected ';' before 'return'
///   --> src/app.cpp:42:13
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

const RED: &str = "\x1b[31;1m";
const YELLOW: &str = "\x1b[33;1m";
const CYAN: &str = "\x1b[36;1m";
const RESET: &str = "\x1b[0m";

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity_prefix(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let code = match severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Note => CYAN,
        };
        format!("{code}{severity}{RESET}")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!("{}: {}\n", self.severity_prefix(diag.severity), diag.message);

        if let Some(file) = &diag.file {
            out.push_str(&format!("  --> {}", file.display()));
            if let Some(line) = diag.line {
                out.push_str(&format!(":{line}"));
                if let Some(col) = diag.column {
                    out.push_str(&format!(":{col}"));
                }
            }
            out.push('\n');
        }

        out
    }
}
