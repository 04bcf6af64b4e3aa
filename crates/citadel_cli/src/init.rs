//! `citadel init` — project scaffolding command.
//!
//! Creates a new project directory with a `src/` layout, a starter
//! `citadel.toml` listing the initial source group, and a hello-world
//! translation unit so the first `citadel build` succeeds out of the box.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::CliTargetKind;

/// Runs the `citadel init` command.
///
/// If `name` is `Some`, creates a new subdirectory with that name.
/// Otherwise initializes the current working directory.
pub fn run(name: Option<String>, kind: CliTargetKind) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = match &name {
        Some(n) => {
            let dir = PathBuf::from(n);
            if dir.exists() {
                return Err(format!("directory '{n}' already exists").into());
            }
            fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };

    let project_name = project_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("my_project");

    eprintln!("  Creating new Citadel project `{project_name}`");

    fs::create_dir_all(project_dir.join("src"))?;
    write_project_file(&project_dir, project_name, kind)?;
    write_main_file(&project_dir, kind)?;

    eprintln!(
        "     Created {}",
        project_dir.join("citadel.toml").display()
    );
    eprintln!(
        "     Created {}",
        project_dir.join("src").join("main.cpp").display()
    );

    Ok(0)
}

/// Writes the starter `citadel.toml`.
fn write_project_file(root: &Path, name: &str, kind: CliTargetKind) -> io::Result<()> {
    let kind_str = match kind {
        CliTargetKind::Application => "application",
        CliTargetKind::SharedLibrary => "shared-library",
        CliTargetKind::StaticLibrary => "static-library",
    };
    let content = format!(
        r#"[project]
name = "{name}"
version = "0.1.0"
kind = "{kind_str}"

[build]
compiler = "cc"
flags = ["-Wall"]

[[groups]]
name = "Source files"
files = ["src/main.cpp"]
"#
    );
    fs::write(root.join("citadel.toml"), content)
}

/// Writes a template main source file.
fn write_main_file(root: &Path, kind: CliTargetKind) -> io::Result<()> {
    let content = match kind {
        CliTargetKind::Application => {
            r#"#include <cstdio>

int main(int argc, char** argv)
{
    (void)argc;
    (void)argv;
    printf("Hello from Citadel\n");
    return 0;
}
"#
        }
        CliTargetKind::SharedLibrary | CliTargetKind::StaticLibrary => {
            r#"int answer()
{
    return 42;
}
"#
        }
    };
    fs::write(root.join("src").join("main.cpp"), content)
}
