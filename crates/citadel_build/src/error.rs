//! Error types for the build scheduler.

use std::path::PathBuf;

/// Errors that stop a pass before any meaningful work happens.
///
/// Failures *inside* a pass, like missing files found in preflight or
/// compile and link errors, are reported through the
/// [`PassReport`](crate::phase::PassReport) so the full diagnostic set
/// reaches the user; this enum covers conditions where no pass can run at
/// all.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A pass is already running for this project.
    ///
    /// At most one pass is active per project; concurrent requests are
    /// rejected, never interleaved or queued implicitly.
    #[error("a build pass is already in progress")]
    BuildInProgress,

    /// A required tool could not be found before work started.
    #[error("toolchain program not available: {0}")]
    ToolchainUnavailable(String),

    /// The worker pool could not be constructed.
    #[error("failed to build worker pool: {0}")]
    Pool(String),

    /// An I/O error occurred preparing the pass.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
