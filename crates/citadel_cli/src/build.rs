//! `citadel build` / `run` / `debug` — the build-trigger commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use citadel_build::{
    BuildOptions, PassOutcome, PassReport, ProcessToolchain, Session,
};
use citadel_config::PostBuildAction;

use crate::report::{render_report, TerminalReporter};
use crate::{BuildArgs, GlobalArgs, RunArgs};

/// Runs the `citadel build` command.
pub fn build(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    run_pass(args, global, None, false)
}

/// Runs the `citadel run` command: build, then launch the binary.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let action = if args.logged {
        PostBuildAction::RunLogged
    } else {
        PostBuildAction::Run
    };
    run_pass(&args.build, global, Some(action), false)
}

/// Runs the `citadel debug` command.
///
/// A project built without debug info is switched to a debug build first,
/// which forces a full rebuild before the debugger launches.
pub fn debug(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    run_pass(args, global, Some(PostBuildAction::Debug), true)
}

fn run_pass(
    args: &BuildArgs,
    global: &GlobalArgs,
    post_build: Option<PostBuildAction>,
    want_debug_info: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_dir(global)?;
    let mut session = Session::open(&project_dir, Arc::new(ProcessToolchain))?;
    session.attach_observer(Arc::new(TerminalReporter::new(global)));

    if !global.quiet {
        let project = session.project();
        eprintln!(
            "   Building {} v{}",
            project.name(),
            project.config().project.version
        );
    }

    if want_debug_info && !session.project().debug_build() {
        if !global.quiet {
            eprintln!("   Enabling debug info (full rebuild)");
        }
        session.project_mut().set_debug_build(true);
    }

    let options = BuildOptions {
        force: args.force,
        check_deps: !args.no_deps,
        post_build,
    };
    let report = session.build(&options)?;
    render_report(&report, args.format, global);

    if !global.quiet {
        print_summary(&report);
    }

    session.close()?;
    Ok(exit_code(&report))
}

/// Resolves the project directory from `--project` or by walking upward.
pub fn resolve_project_dir(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref dir) = global.project {
        return Ok(PathBuf::from(dir));
    }
    find_project_root(&std::env::current_dir()?)
}

/// Walks up from `start` to the nearest directory containing `citadel.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(citadel_config::PROJECT_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {} in {} or any parent directory",
                citadel_config::PROJECT_FILE,
                start.display()
            )
            .into());
        }
    }
}

fn print_summary(report: &PassReport) {
    match report.outcome {
        PassOutcome::Succeeded => {
            if report.dispatched == 0 {
                eprintln!("   Everything up to date.");
            } else {
                eprintln!("   Build complete ({} compiled).", report.dispatched);
            }
        }
        PassOutcome::Failed => eprintln!("   Build failed."),
        PassOutcome::Cancelled => eprintln!("   Build cancelled."),
    }
}

fn exit_code(report: &PassReport) -> i32 {
    match report.outcome {
        PassOutcome::Succeeded => 0,
        PassOutcome::Failed | PassOutcome::Cancelled => 1,
    }
}
