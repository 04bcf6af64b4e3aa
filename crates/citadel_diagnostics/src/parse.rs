//! Parsing of raw toolchain output into structured diagnostics.
//!
//! Compile and link steps hand the orchestrator opaque stderr text; this
//! module turns it into [`Diagnostic`] values. Parsing is a pure function
//! over the text, so it can be replaced or extended without touching the
//! scheduler. The grammar recognized is the common `file:line:col: severity:
//! message` shape emitted by gcc-compatible drivers; anything else is kept
//! verbatim as a note so no output is ever dropped.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::path::PathBuf;

/// Markers searched for in each output line, most specific first.
const SEVERITY_MARKERS: &[(&str, Severity)] = &[
    (": fatal error: ", Severity::Error),
    (": error: ", Severity::Error),
    (": warning: ", Severity::Warning),
    (": note: ", Severity::Note),
];

/// Parses raw toolchain stderr into structured diagnostics.
///
/// Each line is matched against the `file:line:col: severity: message`
/// pattern. Lines mentioning an undefined reference (linker output) become
/// errors without a precise location. Any other non-empty line is preserved
/// as a [`Severity::Note`] diagnostic carrying the raw text.
pub fn parse_tool_output(raw: &str) -> Vec<Diagnostic> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Diagnostic {
    for (marker, severity) in SEVERITY_MARKERS {
        if let Some(pos) = line.find(marker) {
            let message = line[pos + marker.len()..].trim().to_string();
            let (file, line_no, column) = parse_location(&line[..pos]);
            let mut diag = match severity {
                Severity::Error => Diagnostic::error(message),
                Severity::Warning => Diagnostic::warning(message),
                Severity::Note => Diagnostic::note(message),
            };
            if let Some(file) = file {
                diag = diag.with_location(file, line_no, column);
            }
            return diag;
        }
    }

    if line.contains("undefined reference to") || line.contains("duplicate symbol") {
        return Diagnostic::error(line.trim());
    }

    Diagnostic::note(line.trim_end())
}

/// Splits a `path`, `path:line`, or `path:line:col` prefix.
///
/// Trailing numeric segments are taken as line and column; everything before
/// them is the path. A prefix with no numeric tail is still usable as a bare
/// file location.
fn parse_location(prefix: &str) -> (Option<PathBuf>, Option<u32>, Option<u32>) {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return (None, None, None);
    }

    let mut parts: Vec<&str> = prefix.rsplitn(3, ':').collect();
    parts.reverse();

    match parts.as_slice() {
        [path, line, col] => match (line.parse().ok(), col.parse().ok()) {
            (Some(l), Some(c)) => (Some(PathBuf::from(path)), Some(l), Some(c)),
            (_, _) => try_two_part(prefix),
        },
        [path, line] => match line.parse().ok() {
            Some(l) => (Some(PathBuf::from(path)), Some(l), None),
            None => (Some(PathBuf::from(prefix)), None, None),
        },
        _ => (Some(PathBuf::from(prefix)), None, None),
    }
}

/// Re-tries a three-segment prefix as `path:line` where the path itself
/// contained a colon, or falls back to treating the whole prefix as a path.
fn try_two_part(prefix: &str) -> (Option<PathBuf>, Option<u32>, Option<u32>) {
    if let Some((path, line)) = prefix.rsplit_once(':') {
        if let Ok(l) = line.parse() {
            return (Some(PathBuf::from(path)), Some(l), None);
        }
    }
    (Some(PathBuf::from(prefix)), None, None)
}
