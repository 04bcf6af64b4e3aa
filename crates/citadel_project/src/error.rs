//! Error types for project structure operations.

use crate::unit::UnitId;
use std::path::PathBuf;

/// Errors from loading, saving, or mutating a project's structure.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The project file could not be loaded or saved.
    #[error(transparent)]
    Config(#[from] citadel_config::ConfigError),

    /// An I/O error occurred on a project-owned path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is already part of the project.
    #[error("file already in project: {0}")]
    DuplicateFile(PathBuf),

    /// A group with the same name already exists.
    #[error("group already exists: '{0}'")]
    DuplicateGroup(String),

    /// No group with the given name exists.
    #[error("no such group: '{0}'")]
    UnknownGroup(String),

    /// No unit with the given id exists.
    #[error("no such unit: {0:?}")]
    UnknownUnit(UnitId),
}
