//! Parsing and validation of `citadel.toml` project files.
//!
//! This crate reads the project file into a strongly-typed [`ProjectConfig`]
//! and resolves it into the immutable [`BuildContext`] consumed by one build
//! pass: concrete tool names, flag lists, resolved include search paths, and
//! derived output locations.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod loader;
pub mod types;

pub use context::BuildContext;
pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, save_config, PROJECT_FILE};
pub use types::*;
