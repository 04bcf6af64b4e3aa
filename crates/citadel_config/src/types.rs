//! Configuration types serialized to and from `citadel.toml`.

use serde::{Deserialize, Serialize};

/// The top-level project file parsed from `citadel.toml`.
///
/// Holds project metadata, build settings, external tool names, the
/// post-build action, and the ordered group/file listing that defines the
/// project's source set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, version, target kind, flags).
    pub project: ProjectMeta,
    /// Compiler, flag, path, and parallelism settings.
    #[serde(default)]
    pub build: BuildSettings,
    /// Names of the external tools invoked during a pass.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Action performed after a fully successful pass.
    #[serde(default)]
    pub post_build: PostBuildConfig,
    /// Ordered source groups; purely organizational.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Project metadata required in every `citadel.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// The project name; also names the linked binary.
    pub name: String,
    /// The project version string.
    pub version: String,
    /// What the project links into.
    #[serde(default)]
    pub kind: TargetKind,
    /// When set, structural changes are never written back to disk.
    #[serde(default)]
    pub read_only: bool,
    /// Whether to compile with debugging information.
    #[serde(default)]
    pub debug: bool,
}

/// What the linked output of the project is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// An executable binary (default).
    #[default]
    Application,
    /// A shared library (`lib<name>.so`).
    SharedLibrary,
    /// A static archive (`lib<name>.a`).
    StaticLibrary,
}

/// Build settings controlling compilation and linking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// The compiler driver used for compiling and linking.
    pub compiler: String,
    /// Extra flags passed to every compile invocation.
    pub flags: Vec<String>,
    /// Extra flags passed to the link invocation.
    pub link_flags: Vec<String>,
    /// Libraries passed to the linker as `-l<name>`.
    pub libraries: Vec<String>,
    /// Project-local include directories, searched before system ones.
    pub include_dirs: Vec<String>,
    /// System include directories, searched after project-local ones.
    pub system_include_dirs: Vec<String>,
    /// Directory (relative to the project root) receiving all outputs.
    pub output_dir: String,
    /// Whether the compile phase may use multiple workers.
    pub parallel: bool,
    /// Worker count for the compile phase; `0` means auto-detect.
    pub jobs: usize,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            compiler: "cc".to_string(),
            flags: Vec::new(),
            link_flags: Vec::new(),
            libraries: Vec::new(),
            include_dirs: Vec::new(),
            system_include_dirs: Vec::new(),
            output_dir: "build".to_string(),
            parallel: true,
            jobs: 0,
        }
    }
}

/// External tool names; all resolvable via `PATH` or given as paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Compiles resource definitions (`.rdef`) into compiled resources.
    pub resource_compiler: String,
    /// Merges compiled resources into the linked binary.
    pub resource_merger: String,
    /// Creates static archives.
    pub archiver: String,
    /// Debugger launched by the debug post-build action.
    pub debugger: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            resource_compiler: "rc".to_string(),
            resource_merger: "xres".to_string(),
            archiver: "ar".to_string(),
            debugger: "gdb".to_string(),
        }
    }
}

/// Configuration of the action performed after a successful pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostBuildConfig {
    /// The action to perform.
    pub action: PostBuildAction,
    /// Arguments passed to the produced binary when it is run.
    pub args: Vec<String>,
}

/// Action performed after a fully successful build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostBuildAction {
    /// Do nothing (default).
    #[default]
    None,
    /// Launch the produced binary, detached.
    Run,
    /// Run the produced binary and capture its output.
    RunLogged,
    /// Launch the produced binary under the configured debugger.
    Debug,
}

/// One named source group: an ordered list of project-relative file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// The group's display name.
    pub name: String,
    /// Project-relative paths of the files in this group, in order.
    #[serde(default)]
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn target_kind_all_variants() {
        for (input, expected) in [
            ("application", TargetKind::Application),
            ("shared-library", TargetKind::SharedLibrary),
            ("static-library", TargetKind::StaticLibrary),
        ] {
            let toml = format!(
                r#"
[project]
name = "t"
version = "0.1.0"
kind = "{input}"
"#
            );
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.project.kind, expected);
        }
    }

    #[test]
    fn post_build_action_all_variants() {
        for (input, expected) in [
            ("none", PostBuildAction::None),
            ("run", PostBuildAction::Run),
            ("run-logged", PostBuildAction::RunLogged),
            ("debug", PostBuildAction::Debug),
        ] {
            let toml = format!(
                r#"
[project]
name = "t"
version = "0.1.0"

[post_build]
action = "{input}"
"#
            );
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.post_build.action, expected);
        }
    }

    #[test]
    fn build_settings_defaults() {
        let settings = BuildSettings::default();
        assert_eq!(settings.compiler, "cc");
        assert_eq!(settings.output_dir, "build");
        assert!(settings.parallel);
        assert_eq!(settings.jobs, 0);
        assert!(settings.flags.is_empty());
    }

    #[test]
    fn tools_defaults() {
        let tools = ToolsConfig::default();
        assert_eq!(tools.resource_compiler, "rc");
        assert_eq!(tools.resource_merger, "xres");
        assert_eq!(tools.archiver, "ar");
        assert_eq!(tools.debugger, "gdb");
    }

    #[test]
    fn serialize_roundtrip() {
        let toml = r#"
[project]
name = "editor"
version = "1.2.0"
debug = true

[build]
compiler = "g++"
flags = ["-Wall"]

[[groups]]
name = "Source files"
files = ["src/main.cpp"]
"#;
        let config = load_config_from_str(toml).unwrap();
        let out = toml::to_string_pretty(&config).unwrap();
        let back = load_config_from_str(&out).unwrap();
        assert_eq!(back.project.name, "editor");
        assert!(back.project.debug);
        assert_eq!(back.build.compiler, "g++");
        assert_eq!(back.groups.len(), 1);
        assert_eq!(back.groups[0].files, vec!["src/main.cpp"]);
    }
}
