//! The external toolchain boundary.
//!
//! Everything the orchestrator runs (compilers, resource tools, the linked
//! binary itself) goes through the [`Toolchain`] trait. The production
//! implementation shells out synchronously; tests substitute a scripted
//! fake so build passes run without any real compiler installed.

use citadel_project::ToolInvocation;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of one synchronous tool invocation.
#[derive(Clone, Debug)]
pub struct ToolOutput {
    /// Whether the process exited successfully.
    pub success: bool,
    /// The exit code, when the process exited normally.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error; diagnostics are parsed from this.
    pub stderr: String,
}

/// Executes external tools on behalf of the scheduler.
///
/// `run` blocks until the process exits and never fails on a non-zero exit
/// status; that is a captured result, not an error. `Err` is reserved for
/// the process failing to start at all.
pub trait Toolchain: Send + Sync {
    /// Runs an invocation to completion, capturing its output.
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput>;

    /// Launches an invocation without waiting for it (post-build run).
    fn spawn_detached(&self, invocation: &ToolInvocation) -> io::Result<()>;

    /// Probes whether a program can be invoked.
    fn available(&self, program: &str) -> bool;
}

/// The production toolchain: synchronous `std::process` execution.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessToolchain;

impl Toolchain for ProcessToolchain {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()?;
        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_detached(&self, invocation: &ToolInvocation) -> io::Result<()> {
        Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .spawn()?;
        Ok(())
    }

    fn available(&self, program: &str) -> bool {
        let path = Path::new(program);
        if path.components().count() > 1 {
            return path.is_file();
        }
        let Some(paths) = std::env::var_os("PATH") else {
            return false;
        };
        std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    //! A scripted toolchain for exercising the scheduler in tests.

    use super::*;
    use std::sync::Mutex;

    type RunHook = Box<dyn Fn(&ToolInvocation) + Send + Sync>;

    /// Fake toolchain: succeeds by default, creating the `-o` output file so
    /// staleness checks behave as if a real compiler ran.
    #[derive(Default)]
    pub struct ScriptedToolchain {
        /// Invocations whose display contains any of these substrings fail.
        pub fail_matching: Vec<String>,
        /// Stderr text attached to failing invocations.
        pub failure_stderr: String,
        /// Programs reported as unavailable.
        pub missing_programs: Vec<String>,
        /// Every invocation run, in execution order.
        pub invocations: Mutex<Vec<ToolInvocation>>,
        /// Every invocation spawned detached.
        pub spawned: Mutex<Vec<ToolInvocation>>,
        /// Called before each run; used to trigger cancellation mid-pass.
        pub on_run: Option<RunHook>,
    }

    impl ScriptedToolchain {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(matching: &str, stderr: &str) -> Self {
            Self {
                fail_matching: vec![matching.to_string()],
                failure_stderr: stderr.to_string(),
                ..Self::default()
            }
        }

        pub fn run_count(&self) -> usize {
            self.invocations.lock().unwrap().len()
        }

        fn create_output(invocation: &ToolInvocation) {
            let args = &invocation.args;
            if let Some(pos) = args.iter().position(|a| a == "-o") {
                if let Some(out) = args.get(pos + 1) {
                    if let Some(parent) = Path::new(out).parent() {
                        let _ = std::fs::create_dir_all(parent);
                    }
                    let _ = std::fs::write(out, b"artifact");
                }
            } else if invocation.program == "ar" {
                // Archive invocations name the output after the mode flag.
                if let Some(out) = args.get(1) {
                    let _ = std::fs::write(out, b"archive");
                }
            }
        }
    }

    impl Toolchain for ScriptedToolchain {
        fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
            if let Some(hook) = &self.on_run {
                hook(invocation);
            }
            self.invocations.lock().unwrap().push(invocation.clone());

            let display = invocation.to_string();
            if self.fail_matching.iter().any(|m| display.contains(m)) {
                return Ok(ToolOutput {
                    success: false,
                    code: Some(1),
                    stdout: String::new(),
                    stderr: self.failure_stderr.clone(),
                });
            }

            Self::create_output(invocation);
            Ok(ToolOutput {
                success: true,
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            })
        }

        fn spawn_detached(&self, invocation: &ToolInvocation) -> io::Result<()> {
            self.spawned.lock().unwrap().push(invocation.clone());
            Ok(())
        }

        fn available(&self, program: &str) -> bool {
            !self.missing_programs.iter().any(|p| p == program)
        }
    }
}
