//! Resolution of a [`ProjectConfig`] into the per-pass [`BuildContext`].

use crate::types::{PostBuildAction, ProjectConfig, TargetKind};
use std::path::{Path, PathBuf};

/// The immutable configuration bundle shared by all operations of one pass.
///
/// Resolved once when a build pass starts; compile jobs read it concurrently
/// but never mutate it. A later pass resolves a fresh context, and a changed
/// [`fingerprint`](Self::fingerprint) marks every unit as needing rebuild.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Absolute path of the project root.
    pub project_root: PathBuf,
    /// Compiler driver for compile and link steps.
    pub compiler: String,
    /// Tool compiling resource definitions.
    pub resource_compiler: String,
    /// Tool merging compiled resources into the binary.
    pub resource_merger: String,
    /// Tool creating static archives.
    pub archiver: String,
    /// Debugger for the debug post-build action.
    pub debugger: String,
    /// Flags for every compile invocation (includes `-g` for debug builds).
    pub flags: Vec<String>,
    /// Flags for the link invocation.
    pub link_flags: Vec<String>,
    /// Libraries linked as `-l<name>`.
    pub libraries: Vec<String>,
    /// Include search paths: project-local directories first, then system.
    pub include_dirs: Vec<PathBuf>,
    /// Directory receiving the linked output.
    pub output_dir: PathBuf,
    /// Directory receiving per-unit derived artifacts.
    pub object_dir: PathBuf,
    /// Full path of the linked output.
    pub binary_path: PathBuf,
    /// What the project links into.
    pub target_kind: TargetKind,
    /// Whether this is a debug build.
    pub debug: bool,
    /// Worker count for the compile phase (always at least 1).
    pub jobs: usize,
    /// Post-build action configured for the project.
    pub post_build: PostBuildAction,
    /// Arguments handed to the binary when it is run after the pass.
    pub post_build_args: Vec<String>,
}

impl BuildContext {
    /// Resolves the project configuration against its root directory.
    ///
    /// Relative include and output paths are anchored at `project_root`.
    /// The worker count resolves to 1 when parallel builds are disabled,
    /// the configured `jobs` value when given, and the machine's available
    /// parallelism otherwise.
    pub fn resolve(config: &ProjectConfig, project_root: &Path) -> Self {
        let mut flags = config.build.flags.clone();
        if config.project.debug {
            flags.push("-g".to_string());
        }

        let mut include_dirs: Vec<PathBuf> = config
            .build
            .include_dirs
            .iter()
            .map(|d| anchor(project_root, d))
            .collect();
        include_dirs.extend(
            config
                .build
                .system_include_dirs
                .iter()
                .map(|d| anchor(project_root, d)),
        );

        let output_dir = anchor(project_root, &config.build.output_dir);
        let object_dir = output_dir.join("obj");
        let binary_path = output_dir.join(binary_name(&config.project.name, config.project.kind));

        let jobs = if !config.build.parallel {
            1
        } else if config.build.jobs > 0 {
            config.build.jobs
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        };

        Self {
            project_root: project_root.to_path_buf(),
            compiler: config.build.compiler.clone(),
            resource_compiler: config.tools.resource_compiler.clone(),
            resource_merger: config.tools.resource_merger.clone(),
            archiver: config.tools.archiver.clone(),
            debugger: config.tools.debugger.clone(),
            flags,
            link_flags: config.build.link_flags.clone(),
            libraries: config.build.libraries.clone(),
            include_dirs,
            output_dir,
            object_dir,
            binary_path,
            target_kind: config.project.kind,
            debug: config.project.debug,
            jobs,
            post_build: config.post_build.action,
            post_build_args: config.post_build.args.clone(),
        }
    }

    /// A stable fingerprint of everything that influences build outputs.
    ///
    /// Worker count and post-build action are deliberately excluded: they
    /// change how a pass runs, not what it produces. Two contexts with equal
    /// fingerprints produce identical artifacts for identical inputs.
    pub fn fingerprint(&self) -> u64 {
        let mut canon = String::new();
        let mut push = |s: &str| {
            canon.push_str(s);
            canon.push('\x1f');
        };

        push(&self.compiler);
        push(&self.resource_compiler);
        push(&self.resource_merger);
        push(&self.archiver);
        for flag in &self.flags {
            push(flag);
        }
        for flag in &self.link_flags {
            push(flag);
        }
        for lib in &self.libraries {
            push(lib);
        }
        for dir in &self.include_dirs {
            push(&dir.to_string_lossy());
        }
        push(&self.output_dir.to_string_lossy());
        push(match self.target_kind {
            TargetKind::Application => "application",
            TargetKind::SharedLibrary => "shared-library",
            TargetKind::StaticLibrary => "static-library",
        });
        push(if self.debug { "debug" } else { "release" });

        xxhash_rust::xxh3::xxh3_64(canon.as_bytes())
    }
}

/// Anchors a possibly-relative path at the project root.
fn anchor(root: &Path, path: &str) -> PathBuf {
    let p = PathBuf::from(path);
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

/// Derives the linked output's file name from the project name and kind.
fn binary_name(name: &str, kind: TargetKind) -> String {
    match kind {
        TargetKind::Application => name.to_string(),
        TargetKind::SharedLibrary => format!("lib{name}.so"),
        TargetKind::StaticLibrary => format!("lib{name}.a"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn make_config(extra: &str) -> ProjectConfig {
        let toml = format!(
            r#"
[project]
name = "app"
version = "0.1.0"
{extra}
"#
        );
        load_config_from_str(&toml).unwrap()
    }

    #[test]
    fn resolve_defaults() {
        let config = make_config("");
        let ctx = BuildContext::resolve(&config, Path::new("/proj"));
        assert_eq!(ctx.compiler, "cc");
        assert_eq!(ctx.output_dir, PathBuf::from("/proj/build"));
        assert_eq!(ctx.object_dir, PathBuf::from("/proj/build/obj"));
        assert_eq!(ctx.binary_path, PathBuf::from("/proj/build/app"));
        assert!(ctx.jobs >= 1);
        assert!(!ctx.debug);
    }

    #[test]
    fn debug_adds_g_flag() {
        let config = make_config("debug = true");
        let ctx = BuildContext::resolve(&config, Path::new("/proj"));
        assert!(ctx.debug);
        assert!(ctx.flags.contains(&"-g".to_string()));
    }

    #[test]
    fn parallel_disabled_means_one_worker() {
        let toml = r#"
[project]
name = "app"
version = "0.1.0"

[build]
parallel = false
jobs = 8
"#;
        let config = load_config_from_str(toml).unwrap();
        let ctx = BuildContext::resolve(&config, Path::new("/p"));
        assert_eq!(ctx.jobs, 1);
    }

    #[test]
    fn explicit_jobs_respected() {
        let toml = r#"
[project]
name = "app"
version = "0.1.0"

[build]
jobs = 3
"#;
        let config = load_config_from_str(toml).unwrap();
        let ctx = BuildContext::resolve(&config, Path::new("/p"));
        assert_eq!(ctx.jobs, 3);
    }

    #[test]
    fn include_ordering_local_before_system() {
        let toml = r#"
[project]
name = "app"
version = "0.1.0"

[build]
include_dirs = ["include"]
system_include_dirs = ["/usr/include/x"]
"#;
        let config = load_config_from_str(toml).unwrap();
        let ctx = BuildContext::resolve(&config, Path::new("/proj"));
        assert_eq!(
            ctx.include_dirs,
            vec![PathBuf::from("/proj/include"), PathBuf::from("/usr/include/x")]
        );
    }

    #[test]
    fn library_target_names() {
        let shared = make_config("kind = \"shared-library\"");
        let ctx = BuildContext::resolve(&shared, Path::new("/p"));
        assert_eq!(ctx.binary_path, PathBuf::from("/p/build/libapp.so"));

        let stat = make_config("kind = \"static-library\"");
        let ctx = BuildContext::resolve(&stat, Path::new("/p"));
        assert_eq!(ctx.binary_path, PathBuf::from("/p/build/libapp.a"));
    }

    #[test]
    fn fingerprint_stable_for_equal_contexts() {
        let config = make_config("");
        let a = BuildContext::resolve(&config, Path::new("/p"));
        let b = BuildContext::resolve(&config, Path::new("/p"));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_flags() {
        let plain = make_config("");
        let debug = make_config("debug = true");
        let a = BuildContext::resolve(&plain, Path::new("/p"));
        let b = BuildContext::resolve(&debug, Path::new("/p"));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_jobs() {
        let config = make_config("");
        let mut a = BuildContext::resolve(&config, Path::new("/p"));
        let mut b = BuildContext::resolve(&config, Path::new("/p"));
        a.jobs = 1;
        b.jobs = 16;
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
