//! Build pass phases, per-unit outcomes, and the aggregate report.

use citadel_diagnostics::Diagnostic;
use citadel_project::UnitId;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The phases a build pass moves through, in order.
///
/// A pass may stop early: preflight failure, compile failure, or
/// cancellation all end the pass without entering later phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Missing-file and toolchain checks before any work.
    Preflight,
    /// Parallel compilation of the stale subset.
    Compiling,
    /// Linking objects into the output binary.
    Linking,
    /// Merging compiled resources into the binary.
    ResourceMerge,
    /// The configured action after a fully successful pass.
    PostBuild,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Preflight => write!(f, "preflight"),
            Phase::Compiling => write!(f, "compiling"),
            Phase::Linking => write!(f, "linking"),
            Phase::ResourceMerge => write!(f, "resource merge"),
            Phase::PostBuild => write!(f, "post-build"),
        }
    }
}

/// The aggregate outcome of one build pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassOutcome {
    /// Every phase completed without failures.
    Succeeded,
    /// Preflight, a compile job, the link, or the merge failed.
    Failed,
    /// Cancellation was requested before the pass could finish.
    ///
    /// Distinct from failure: dispatched jobs may all have succeeded.
    Cancelled,
}

/// The outcome of one unit within a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "result")]
pub enum UnitOutcome {
    /// The unit was stale and compiled successfully.
    Compiled,
    /// The unit's artifact was already up to date; no job dispatched.
    Skipped,
    /// The unit's compile job failed.
    Failed {
        /// Diagnostics parsed from the toolchain output.
        diagnostics: Vec<Diagnostic>,
    },
}

/// Identity of a unit as seen by observers: stable id plus stored path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitRef {
    /// The unit's id within its project.
    pub id: UnitId,
    /// The unit's project-relative path.
    pub path: PathBuf,
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// One unit's result within a pass report.
#[derive(Clone, Debug, Serialize)]
pub struct UnitResult {
    /// Which unit this result belongs to.
    pub unit: UnitRef,
    /// What happened to it.
    pub outcome: UnitOutcome,
}

/// Everything a finished pass reports: outcomes, diagnostics, counts.
///
/// The report always carries the full diagnostic set of the pass (every
/// failed unit's errors, warnings from successful compiles, link and
/// merge output), not just the first failure.
#[derive(Clone, Debug, Serialize)]
pub struct PassReport {
    /// The aggregate outcome.
    pub outcome: PassOutcome,
    /// Per-unit results for all participating units the pass considered.
    pub units: Vec<UnitResult>,
    /// All diagnostics emitted during the pass, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of compile jobs actually dispatched.
    pub dispatched: usize,
}

impl PassReport {
    /// Returns `true` if the pass succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcome == PassOutcome::Succeeded
    }

    /// Number of units whose compile job failed.
    pub fn failed_units(&self) -> usize {
        self.units
            .iter()
            .filter(|r| matches!(r.outcome, UnitOutcome::Failed { .. }))
            .count()
    }

    /// Number of error-severity diagnostics in the report.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}
