//! Citadel CLI — the command-line trigger surface for the build core.
//!
//! Provides `citadel init` for project scaffolding, `citadel build` /
//! `run` / `debug` for triggering build passes, `citadel deps` for
//! refreshing dependency records, and `citadel add` / `remove` for
//! structural edits. This binary is deliberately thin: everything of
//! substance lives in the library crates, and the terminal output here is
//! just one observer attached to the session.

#![warn(missing_docs)]

mod build;
mod files;
mod init;
mod report;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Citadel — an incremental build orchestrator.
#[derive(Parser, Debug)]
#[command(name = "citadel", version, about = "Citadel build orchestrator")]
pub struct Cli {
    /// Suppress all output except diagnostics.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to the project directory (default: search upward from here).
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Citadel project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes
        /// the current directory.
        name: Option<String>,

        /// What the project links into.
        #[arg(short, long, value_enum, default_value_t = CliTargetKind::Application)]
        kind: CliTargetKind,
    },
    /// Build the project incrementally.
    Build(BuildArgs),
    /// Build, then run the produced binary.
    Run(RunArgs),
    /// Build with debug info, then launch under the debugger.
    Debug(BuildArgs),
    /// Rescan the dependency records of every source file.
    Deps,
    /// Add files to the project.
    Add(AddArgs),
    /// Remove files from the project.
    Remove(RemoveArgs),
}

/// Arguments for `citadel build` (shared with `debug`).
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Rebuild everything, ignoring timestamps.
    #[arg(short, long)]
    pub force: bool,

    /// Skip dependency mtime comparison (self-mtime only).
    #[arg(long)]
    pub no_deps: bool,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `citadel run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Build arguments.
    #[command(flatten)]
    pub build: BuildArgs,

    /// Run attached, capturing the program's output into the report.
    #[arg(long)]
    pub logged: bool,
}

/// Arguments for `citadel add`.
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Project-relative paths of the files to add.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Group to add the files to (default: the last group).
    #[arg(short, long)]
    pub group: Option<String>,
}

/// Arguments for `citadel remove`.
#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Project-relative paths of the files to remove.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Also delete each removed file's derived object artifact.
    #[arg(long)]
    pub delete_objects: bool,
}

/// What the scaffolded project links into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliTargetKind {
    /// An executable binary.
    Application,
    /// A shared library.
    SharedLibrary,
    /// A static archive.
    StaticLibrary,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-diagnostic output.
    pub quiet: bool,
    /// Whether to log debug-level information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional explicit project directory.
    pub project: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let color = match cli.color {
        ColorChoice::Auto => terminal_likely(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        project: cli.project,
    };

    let result = match cli.command {
        Command::Init { name, kind } => init::run(name, kind),
        Command::Build(ref args) => build::build(args, &global),
        Command::Run(ref args) => build::run(args, &global),
        Command::Debug(ref args) => build::debug(args, &global),
        Command::Deps => files::deps(&global),
        Command::Add(ref args) => files::add(args, &global),
        Command::Remove(ref args) => files::remove(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Rough terminal detection for auto color.
fn terminal_likely() -> bool {
    std::env::var("TERM").is_ok()
}
