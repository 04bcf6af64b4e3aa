//! Project-file loading, validation, and saving.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::HashSet;
use std::path::Path;

/// Name of the project file looked up in the project root.
pub const PROJECT_FILE: &str = "citadel.toml";

/// Loads and validates a `citadel.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(PROJECT_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates a `citadel.toml` from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Serializes a configuration back to `<project_dir>/citadel.toml`.
pub fn save_config(config: &ProjectConfig, project_dir: &Path) -> Result<(), ConfigError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    std::fs::write(project_dir.join(PROJECT_FILE), content)?;
    Ok(())
}

/// Validates required fields and structural consistency.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.version.is_empty() {
        return Err(ConfigError::MissingField("project.version".to_string()));
    }

    let mut group_names = HashSet::new();
    let mut files = HashSet::new();
    for group in &config.groups {
        if group.name.is_empty() {
            return Err(ConfigError::Validation("group with empty name".to_string()));
        }
        if !group_names.insert(group.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate group name '{}'",
                group.name
            )));
        }
        for file in &group.files {
            if !files.insert(file.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "file '{file}' listed more than once"
                )));
            }
        }
    }

    Ok(())
}
