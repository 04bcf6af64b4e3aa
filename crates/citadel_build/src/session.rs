//! The per-project session object.
//!
//! A [`Session`] ties one open [`Project`] to one [`BuildRunner`] and the
//! observers attached to it, with a deterministic lifecycle: created when a
//! project opens, torn down (saving structure and state) when it closes.
//! Everything the presentation layer triggers (build, force rebuild, run,
//! update dependencies) goes through the session rather than through
//! ambient globals.

use crate::cancel::CancelToken;
use crate::error::BuildError;
use crate::observer::BuildObserver;
use crate::phase::PassReport;
use crate::runner::{BuildOptions, BuildRunner};
use crate::toolchain::Toolchain;
use citadel_project::{Project, ProjectError};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One open project plus its build machinery.
pub struct Session {
    project: Project,
    runner: BuildRunner,
    cancel: CancelToken,
}

impl Session {
    /// Opens the project at `root` and restores its sidecar state.
    pub fn open(root: &Path, toolchain: Arc<dyn Toolchain>) -> Result<Self, ProjectError> {
        let project = Project::open(root)?;
        Ok(Self::from_project(project, toolchain))
    }

    /// Wraps an already-loaded project in a session.
    pub fn from_project(mut project: Project, toolchain: Arc<dyn Toolchain>) -> Self {
        let ctx = project.build_context();
        project.load_state(&ctx.output_dir);
        Self {
            project,
            runner: BuildRunner::new(toolchain),
            cancel: CancelToken::new(),
        }
    }

    /// Attaches an observer to every subsequent pass in this session.
    pub fn attach_observer(&mut self, observer: Arc<dyn BuildObserver>) {
        self.runner.attach_observer(observer);
    }

    /// The open project.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Mutable access for structural edits between passes.
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// The token that cancels this session's running pass.
    ///
    /// Clones stay wired across passes; the flag is cleared when a new
    /// pass starts.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs one build pass with the session's observers attached.
    ///
    /// Dependency records refreshed during the pass are persisted
    /// opportunistically afterwards.
    pub fn build(&mut self, options: &BuildOptions) -> Result<PassReport, BuildError> {
        self.cancel.reset();
        let report = self.runner.run(&mut self.project, options, &self.cancel)?;

        let ctx = self.project.build_context();
        if let Err(e) = self.project.save_state(&ctx.output_dir) {
            debug!(error = %e, "sidecar state not saved");
        }
        Ok(report)
    }

    /// Rescans dependency records for all units and persists them.
    ///
    /// Returns the number of units scanned.
    pub fn update_dependencies(&mut self) -> usize {
        let ctx = self.project.build_context();
        let scanned = self.project.update_dependencies(&ctx.include_dirs);
        if let Err(e) = self.project.save_state(&ctx.output_dir) {
            debug!(error = %e, "sidecar state not saved");
        }
        scanned
    }

    /// Closes the session, saving project structure and sidecar state.
    pub fn close(self) -> Result<(), ProjectError> {
        let ctx = self.project.build_context();
        if let Err(e) = self.project.save_state(&ctx.output_dir) {
            debug!(error = %e, "sidecar state not saved");
        }
        self.project.save()
    }
}
