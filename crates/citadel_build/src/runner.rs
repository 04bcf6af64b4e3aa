//! The build pass: snapshot, dispatch, phase sequencing, write-back.

use crate::cancel::CancelToken;
use crate::error::BuildError;
use crate::observer::{BuildObserver, ObserverSet};
use crate::phase::{PassOutcome, PassReport, Phase, UnitOutcome, UnitRef, UnitResult};
use crate::stamp;
use crate::toolchain::Toolchain;
use citadel_config::{BuildContext, PostBuildAction, TargetKind};
use citadel_diagnostics::{parse_tool_output, Diagnostic};
use citadel_project::{BuildFlag, Freshness, Project, SourceKind, ToolInvocation};
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Options for one build pass.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Treat every participating unit as stale and clear artifacts first.
    pub force: bool,
    /// Compare dependency mtimes during staleness checks.
    pub check_deps: bool,
    /// Overrides the project's configured post-build action for this pass.
    pub post_build: Option<PostBuildAction>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            force: false,
            check_deps: true,
            post_build: None,
        }
    }
}

/// Immutable per-unit snapshot taken before any job is dispatched.
///
/// The pass works exclusively from these plans; structural edits to the
/// project made while a pass runs apply to the next pass only.
struct UnitPlan {
    unit: UnitRef,
    kind: SourceKind,
    freshness: Freshness,
    job: Option<ToolInvocation>,
    object: Option<PathBuf>,
    merge: Option<PathBuf>,
}

/// Runs build passes for one project.
///
/// At most one pass is active at a time; a second [`run`](Self::run) while
/// one is in flight returns [`BuildError::BuildInProgress`].
pub struct BuildRunner {
    toolchain: Arc<dyn Toolchain>,
    observers: ObserverSet,
    active: AtomicBool,
}

/// Clears the active flag when a pass ends, however it ends.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl BuildRunner {
    /// Creates a runner executing external tools through `toolchain`.
    pub fn new(toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            toolchain,
            observers: ObserverSet::new(),
            active: AtomicBool::new(false),
        }
    }

    /// Attaches an observer to all subsequent passes.
    pub fn attach_observer(&mut self, observer: Arc<dyn BuildObserver>) {
        self.observers.add(observer);
    }

    /// Runs one build pass over the project.
    ///
    /// Returns `Err` only for conditions that prevent a pass from running
    /// at all (concurrent pass, unavailable toolchain, I/O failures while
    /// preparing). Failures *within* the pass (missing files, compile and
    /// link errors) come back as a [`PassReport`] with outcome
    /// [`PassOutcome::Failed`] and the full diagnostic set attached.
    pub fn run(
        &self,
        project: &mut Project,
        options: &BuildOptions,
        cancel: &CancelToken,
    ) -> Result<PassReport, BuildError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(BuildError::BuildInProgress);
        }
        let _guard = ActiveGuard(&self.active);
        self.run_pass(project, options, cancel)
    }

    fn run_pass(
        &self,
        project: &mut Project,
        options: &BuildOptions,
        cancel: &CancelToken,
    ) -> Result<PassReport, BuildError> {
        let ctx = project.build_context();
        let fingerprint = ctx.fingerprint();

        // Configuration errors surface before anything is touched; a
        // missing compiler must not clear artifacts it cannot rebuild.
        self.check_tools(project, &ctx)?;

        // Objects produced under a different context are unusable.
        let context_changed = stamp::read_stamp(&ctx.object_dir) != Some(fingerprint);
        let force = options.force || project.needs_full_rebuild() || context_changed;
        if force {
            debug!(context_changed, "full rebuild");
            project.force_rebuild();
            for unit in project.units() {
                if unit.participates_in_build() {
                    unit.remove_object(&ctx).map_err(|source| BuildError::Io {
                        path: unit.path().to_path_buf(),
                        source,
                    })?;
                }
            }
            // Artifacts are gone; anything compiled from here on belongs to
            // the current context, even if this pass fails partway.
            if let Err(e) = stamp::write_stamp(&ctx.object_dir, fingerprint) {
                debug!(error = %e, "context stamp not written");
            }
            // The full rebuild is honored: from here the per-unit Forced
            // flags and the cleared artifacts carry it, pass or fail.
            project.clear_full_rebuild();
        }

        std::fs::create_dir_all(&ctx.object_dir).map_err(|source| BuildError::Io {
            path: ctx.object_dir.clone(),
            source,
        })?;

        // -- Preflight --

        self.observers.phase_changed(Phase::Preflight);

        let plans: Vec<UnitPlan> = project
            .units()
            .filter(|u| u.participates_in_build())
            .map(|u| UnitPlan {
                unit: UnitRef {
                    id: u.id(),
                    path: u.path().to_path_buf(),
                },
                kind: u.kind(),
                freshness: u.freshness(&ctx, options.check_deps),
                job: u.compile_job(&ctx),
                object: u.object_path(&ctx),
                merge: u.merge_artifact(&ctx),
            })
            .collect();

        let missing: Vec<&UnitPlan> = plans
            .iter()
            .filter(|p| p.freshness == Freshness::MissingSource)
            .collect();
        if !missing.is_empty() {
            let diagnostics = missing
                .iter()
                .map(|p| Diagnostic::error(format!("missing source file: {}", p.unit.path.display())))
                .collect();
            return Ok(self.finish(PassReport {
                outcome: PassOutcome::Failed,
                units: Vec::new(),
                diagnostics,
                dispatched: 0,
            }));
        }

        // -- Compiling --

        if cancel.is_cancelled() {
            return Ok(self.finish(PassReport {
                outcome: PassOutcome::Cancelled,
                units: Vec::new(),
                diagnostics: Vec::new(),
                dispatched: 0,
            }));
        }
        self.observers.phase_changed(Phase::Compiling);

        let stale: Vec<usize> = plans
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p.freshness, Freshness::Stale(_)) && p.job.is_some())
            .map(|(i, _)| i)
            .collect();
        let total = stale.len();

        let completed: Mutex<Vec<(usize, UnitOutcome, Vec<Diagnostic>)>> = Mutex::new(Vec::new());
        if total > 0 {
            let workers = ctx.jobs.clamp(1, total);
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| BuildError::Pool(e.to_string()))?;

            // Workers pull indices from a shared counter: the whole batch
            // is submitted up front, completions arrive in any order, and
            // cancellation is re-checked before every job begins.
            let next = AtomicUsize::new(0);
            let started = AtomicUsize::new(0);
            pool.scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(|_| loop {
                        let slot = next.fetch_add(1, Ordering::SeqCst);
                        if slot >= total || cancel.is_cancelled() {
                            break;
                        }
                        let plan = &plans[stale[slot]];
                        let Some(job) = plan.job.as_ref() else {
                            continue;
                        };
                        let seq = started.fetch_add(1, Ordering::SeqCst) + 1;
                        self.observers.unit_started(&plan.unit, seq, total);
                        let (outcome, diags) = self.compile_one(&plan.unit, job);
                        self.observers.unit_finished(&plan.unit, &outcome);
                        completed.lock().unwrap().push((stale[slot], outcome, diags));
                    });
                }
            });
        }

        let completed = completed
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dispatched = completed.len();

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut outcomes: Vec<Option<UnitOutcome>> = plans.iter().map(|_| None).collect();
        for (idx, outcome, diags) in completed {
            diagnostics.extend(diags);
            outcomes[idx] = Some(outcome);
        }

        let mut units: Vec<UnitResult> = Vec::with_capacity(plans.len());
        for (i, plan) in plans.iter().enumerate() {
            let outcome = match outcomes[i].take() {
                Some(outcome) => outcome,
                // Units that were up to date are reported as skipped; stale
                // units never dispatched (cancellation) have no result.
                None => match plan.freshness {
                    Freshness::UpToDate => UnitOutcome::Skipped,
                    _ => continue,
                },
            };
            units.push(UnitResult {
                unit: plan.unit.clone(),
                outcome,
            });
        }

        // Write flags back from what actually happened.
        for result in &units {
            if let Some(unit) = project.unit_mut(result.unit.id) {
                let flag = match result.outcome {
                    UnitOutcome::Compiled | UnitOutcome::Skipped => BuildFlag::UpToDate,
                    UnitOutcome::Failed { .. } => BuildFlag::NeedsBuild,
                };
                unit.set_build_flag(flag);
            }
        }

        if cancel.is_cancelled() {
            return Ok(self.finish(PassReport {
                outcome: PassOutcome::Cancelled,
                units,
                diagnostics,
                dispatched,
            }));
        }

        let failed = units
            .iter()
            .any(|r| matches!(r.outcome, UnitOutcome::Failed { .. }));
        if failed {
            return Ok(self.finish(PassReport {
                outcome: PassOutcome::Failed,
                units,
                diagnostics,
                dispatched,
            }));
        }

        // -- Linking --

        if cancel.is_cancelled() {
            return Ok(self.finish(PassReport {
                outcome: PassOutcome::Cancelled,
                units,
                diagnostics,
                dispatched,
            }));
        }

        // Nothing recompiled and the output exists: the link is current.
        let relink = dispatched > 0 || !ctx.binary_path.exists();
        if relink {
            self.observers.phase_changed(Phase::Linking);
            let objects: Vec<PathBuf> = plans
                .iter()
                .filter(|p| p.kind.links())
                .filter_map(|p| p.object.clone())
                .collect();
            if objects.is_empty() {
                debug!("no objects to link");
            } else if let Err(link_diags) = self.run_step(&link_invocation(&ctx, &objects)) {
                diagnostics.extend(link_diags);
                return Ok(self.finish(PassReport {
                    outcome: PassOutcome::Failed,
                    units,
                    diagnostics,
                    dispatched,
                }));
            }

            // -- ResourceMerge --

            if cancel.is_cancelled() {
                return Ok(self.finish(PassReport {
                    outcome: PassOutcome::Cancelled,
                    units,
                    diagnostics,
                    dispatched,
                }));
            }
            self.observers.phase_changed(Phase::ResourceMerge);
            let resources: Vec<PathBuf> = plans.iter().filter_map(|p| p.merge.clone()).collect();
            if !resources.is_empty() {
                let mut args = vec!["-o".to_string(), ctx.binary_path.display().to_string()];
                args.extend(resources.iter().map(|r| r.display().to_string()));
                let job = ToolInvocation::new(&ctx.resource_merger, args);
                if let Err(merge_diags) = self.run_step(&job) {
                    diagnostics.extend(merge_diags);
                    return Ok(self.finish(PassReport {
                        outcome: PassOutcome::Failed,
                        units,
                        diagnostics,
                        dispatched,
                    }));
                }
            }
        } else {
            debug!("output is current, link skipped");
        }

        // -- PostBuild --

        if cancel.is_cancelled() {
            return Ok(self.finish(PassReport {
                outcome: PassOutcome::Cancelled,
                units,
                diagnostics,
                dispatched,
            }));
        }
        self.observers.phase_changed(Phase::PostBuild);
        let action = options.post_build.unwrap_or(ctx.post_build);
        self.run_post_build(action, &ctx, &mut diagnostics);

        Ok(self.finish(PassReport {
            outcome: PassOutcome::Succeeded,
            units,
            diagnostics,
            dispatched,
        }))
    }

    /// Verifies every tool the pass will need before any work starts.
    fn check_tools(&self, project: &Project, ctx: &BuildContext) -> Result<(), BuildError> {
        let mut required: Vec<&str> = vec![&ctx.compiler];
        if project.units().any(|u| u.kind() == SourceKind::ResourceDef) {
            required.push(&ctx.resource_compiler);
        }
        if project.units().any(|u| {
            matches!(u.kind(), SourceKind::ResourceDef | SourceKind::ResourceCompiled)
        }) {
            required.push(&ctx.resource_merger);
        }
        if ctx.target_kind == TargetKind::StaticLibrary {
            required.push(&ctx.archiver);
        }

        for program in required {
            if !self.toolchain.available(program) {
                return Err(BuildError::ToolchainUnavailable(program.to_string()));
            }
        }
        Ok(())
    }

    /// Compiles one unit, capturing all toolchain failure as a result.
    fn compile_one(&self, unit: &UnitRef, job: &ToolInvocation) -> (UnitOutcome, Vec<Diagnostic>) {
        debug!(unit = %unit, command = %job, "compiling");
        match self.toolchain.run(job) {
            Ok(out) if out.success => {
                // Warnings from a successful compile still reach the report.
                (UnitOutcome::Compiled, parse_tool_output(&out.stderr))
            }
            Ok(out) => {
                let mut diags = parse_tool_output(&out.stderr);
                if !diags.iter().any(Diagnostic::is_error) {
                    let code = out
                        .code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    diags.push(Diagnostic::error(format!(
                        "{} failed with exit code {code}",
                        job.program
                    )));
                }
                (
                    UnitOutcome::Failed {
                        diagnostics: diags.clone(),
                    },
                    diags,
                )
            }
            Err(e) => {
                let diag = Diagnostic::error(format!("failed to invoke {}: {e}", job.program));
                (
                    UnitOutcome::Failed {
                        diagnostics: vec![diag.clone()],
                    },
                    vec![diag],
                )
            }
        }
    }

    /// Runs a sequential step (link, merge), turning failure into diagnostics.
    fn run_step(&self, job: &ToolInvocation) -> Result<(), Vec<Diagnostic>> {
        debug!(command = %job, "running");
        match self.toolchain.run(job) {
            Ok(out) if out.success => Ok(()),
            Ok(out) => {
                let mut diags = parse_tool_output(&out.stderr);
                if !diags.iter().any(Diagnostic::is_error) {
                    diags.push(Diagnostic::error(format!("{} failed", job.program)));
                }
                Err(diags)
            }
            Err(e) => Err(vec![Diagnostic::error(format!(
                "failed to invoke {}: {e}",
                job.program
            ))]),
        }
    }

    /// Performs the post-build action after a fully successful pass.
    ///
    /// A post-build launch failure does not fail the pass, since the build
    /// itself succeeded, but it is reported as a warning.
    fn run_post_build(
        &self,
        action: PostBuildAction,
        ctx: &BuildContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let binary = ctx.binary_path.display().to_string();
        match action {
            PostBuildAction::None => {}
            PostBuildAction::Run => {
                let job = ToolInvocation::new(&binary, ctx.post_build_args.clone());
                if let Err(e) = self.toolchain.spawn_detached(&job) {
                    diagnostics.push(Diagnostic::warning(format!("failed to launch {binary}: {e}")));
                }
            }
            PostBuildAction::RunLogged => {
                let job = ToolInvocation::new(&binary, ctx.post_build_args.clone());
                match self.toolchain.run(&job) {
                    Ok(out) => {
                        for line in out.stdout.lines().chain(out.stderr.lines()) {
                            if !line.trim().is_empty() {
                                diagnostics.push(Diagnostic::note(line));
                            }
                        }
                        if !out.success {
                            diagnostics.push(Diagnostic::warning(format!(
                                "{binary} exited with code {}",
                                out.code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
                            )));
                        }
                    }
                    Err(e) => {
                        diagnostics.push(Diagnostic::warning(format!("failed to run {binary}: {e}")));
                    }
                }
            }
            PostBuildAction::Debug => {
                let mut args = vec!["--args".to_string(), binary.clone()];
                args.extend(ctx.post_build_args.iter().cloned());
                let job = ToolInvocation::new(&ctx.debugger, args);
                if let Err(e) = self.toolchain.spawn_detached(&job) {
                    diagnostics.push(Diagnostic::warning(format!(
                        "failed to launch debugger on {binary}: {e}"
                    )));
                }
            }
        }
    }

    fn finish(&self, report: PassReport) -> PassReport {
        self.observers.pass_finished(&report);
        report
    }
}

/// Derives the link (or archive) command for the project's target kind.
fn link_invocation(ctx: &BuildContext, objects: &[PathBuf]) -> ToolInvocation {
    match ctx.target_kind {
        TargetKind::StaticLibrary => {
            let mut args = vec!["rcs".to_string(), ctx.binary_path.display().to_string()];
            args.extend(objects.iter().map(|o| o.display().to_string()));
            ToolInvocation::new(&ctx.archiver, args)
        }
        kind => {
            let mut args = Vec::new();
            if kind == TargetKind::SharedLibrary {
                args.push("-shared".to_string());
            }
            args.extend(ctx.link_flags.iter().cloned());
            args.extend(objects.iter().map(|o| o.display().to_string()));
            args.push("-o".to_string());
            args.push(ctx.binary_path.display().to_string());
            args.extend(ctx.libraries.iter().map(|l| format!("-l{l}")));
            ToolInvocation::new(&ctx.compiler, args)
        }
    }
}
