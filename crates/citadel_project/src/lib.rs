//! The project data model: groups, source units, staleness, persistence.
//!
//! A [`Project`] is an ordered collection of named [`Group`]s, each owning an
//! ordered sequence of [`SourceUnit`]s. Units know their [`SourceKind`]
//! (resolved once from the file extension), how to test their own staleness
//! against a [`BuildContext`](citadel_config::BuildContext), how to derive
//! their compile command, and where their object artifact lives.
//!
//! The project file (`citadel.toml`) persists the structure; dependency
//! records and unit flags live in a sidecar state file under the output
//! directory so reopening a project does not force a full rescan.

#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod group;
pub mod kind;
pub mod project;
pub mod state;
pub mod unit;

pub use command::ToolInvocation;
pub use error::ProjectError;
pub use group::Group;
pub use kind::SourceKind;
pub use project::Project;
pub use unit::{BuildFlag, Freshness, SourceUnit, StaleReason, UnitId};
