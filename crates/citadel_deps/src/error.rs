//! Error types for dependency scanning.

use std::path::PathBuf;

/// Errors that can occur while scanning a source file's dependencies.
///
/// Only the file being scanned can fail the scan; includes that cannot be
/// resolved or read are skipped, because a textual scanner cannot prove
/// non-existence.
#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    /// The file to scan could not be read.
    #[error("cannot scan {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
