//! The structured diagnostic type produced from toolchain output.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single structured diagnostic from a compile or link step.
///
/// Carries an optional source location because not all toolchain output can
/// be attributed to a file and line (linker errors, driver messages). The
/// original raw line is preserved in `message` for lines that cannot be
/// split into location and text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of this diagnostic.
    pub severity: Severity,
    /// The source file the diagnostic refers to, if one could be determined.
    pub file: Option<PathBuf>,
    /// The 1-based line number, if present in the toolchain output.
    pub line: Option<u32>,
    /// The 1-based column number, if present in the toolchain output.
    pub column: Option<u32>,
    /// The diagnostic message text.
    pub message: String,
}

impl Diagnostic {
    /// Creates an error diagnostic with no source location.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Creates a warning diagnostic with no source location.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Creates a note diagnostic with no source location.
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            file: None,
            line: None,
            column: None,
            message: message.into(),
        }
    }

    /// Attaches a source location to this diagnostic.
    pub fn with_location(
        mut self,
        file: impl Into<PathBuf>,
        line: Option<u32>,
        column: Option<u32>,
    ) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self.column = column;
        self
    }

    /// Returns `true` if this diagnostic has error severity.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
                if let Some(col) = self.column {
                    write!(f, ":{col}")?;
                }
            }
            write!(f, ": ")?;
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}
