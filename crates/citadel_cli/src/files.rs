//! `citadel add` / `remove` / `deps` — structural and maintenance commands.

use std::path::Path;
use std::sync::Arc;

use citadel_build::{ProcessToolchain, Session};

use crate::build::resolve_project_dir;
use crate::{AddArgs, GlobalArgs, RemoveArgs};

/// Runs the `citadel add` command.
pub fn add(args: &AddArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_dir(global)?;
    let mut session = Session::open(&project_dir, Arc::new(ProcessToolchain))?;

    for file in &args.files {
        session
            .project_mut()
            .add_file(file.as_str(), args.group.as_deref())?;
        if !global.quiet {
            eprintln!("   Added {file}");
        }
    }

    session.close()?;
    Ok(0)
}

/// Runs the `citadel remove` command.
pub fn remove(args: &RemoveArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_dir(global)?;
    let mut session = Session::open(&project_dir, Arc::new(ProcessToolchain))?;
    let ctx = session.project().build_context();

    let mut missing = Vec::new();
    for file in &args.files {
        let Some(id) = session
            .project()
            .unit_by_path(Path::new(file))
            .map(|u| u.id())
        else {
            missing.push(file.clone());
            continue;
        };
        let unit = session.project_mut().remove_unit(id)?;
        if args.delete_objects {
            unit.remove_object(&ctx)?;
        }
        if !global.quiet {
            eprintln!("   Removed {file}");
        }
    }

    session.close()?;

    if !missing.is_empty() {
        return Err(format!("not in project: {}", missing.join(", ")).into());
    }
    Ok(0)
}

/// Runs the `citadel deps` command.
pub fn deps(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_dir(global)?;
    let mut session = Session::open(&project_dir, Arc::new(ProcessToolchain))?;

    let scanned = session.update_dependencies();
    if !global.quiet {
        eprintln!("   Updated dependencies for {scanned} file(s)");
    }

    session.close()?;
    Ok(0)
}
