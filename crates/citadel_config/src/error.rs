//! Error types for project-file loading and validation.

/// Errors that can occur when loading, validating, or saving `citadel.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading or writing the project file.
    #[error("failed to read project file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse project file: {0}")]
    Parse(String),

    /// The configuration could not be serialized back to TOML.
    #[error("failed to serialize project file: {0}")]
    Serialize(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}
