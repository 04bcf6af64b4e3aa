//! The build scheduler: staleness, dispatch, phases, cancellation, reporting.
//!
//! A build pass moves through `Preflight → Compiling → Linking →
//! ResourceMerge → PostBuild` and ends `Succeeded`, `Failed`, or
//! `Cancelled`. The [`BuildRunner`] computes the stale subset of a project's
//! units, dispatches compile jobs over a bounded worker pool, and reports
//! every completion to the attached [`BuildObserver`]s as it happens.
//! External processes run behind the [`Toolchain`] trait so tests can
//! substitute a scripted fake.

#![warn(missing_docs)]

pub mod cancel;
pub mod error;
pub mod observer;
pub mod phase;
pub mod runner;
pub mod session;
pub mod stamp;
pub mod toolchain;

pub use cancel::CancelToken;
pub use error::BuildError;
pub use observer::{BuildObserver, ObserverSet};
pub use phase::{PassOutcome, PassReport, Phase, UnitOutcome, UnitRef, UnitResult};
pub use runner::{BuildOptions, BuildRunner};
pub use session::Session;
pub use toolchain::{ProcessToolchain, ToolOutput, Toolchain};
