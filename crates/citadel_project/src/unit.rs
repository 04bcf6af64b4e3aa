//! A single source file and its build-relevant behavior.

use crate::command::ToolInvocation;
use crate::kind::SourceKind;
use citadel_config::BuildContext;
use citadel_deps::DependencyRecord;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Stable identifier of a unit within its project.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates an id from its raw value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw value of this id.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Per-unit build bookkeeping flag.
///
/// Records the last known relationship between the unit and its derived
/// artifact. The flag is a hint written back after checks and passes; the
/// authoritative staleness test is [`SourceUnit::freshness`], which always
/// re-stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildFlag {
    /// The unit is believed to need building (default for new units).
    #[default]
    NeedsBuild,
    /// The unit's artifact was up to date after the last check or pass.
    UpToDate,
    /// The unit must build next pass regardless of timestamps.
    Forced,
}

/// Result of a staleness check against a build context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// The derived artifact is current; no work needed.
    UpToDate,
    /// The unit must be compiled, for the given reason.
    Stale(StaleReason),
    /// The source file itself is missing from disk.
    ///
    /// Distinct from stale: missing units block a pass during preflight
    /// instead of being silently compiled or skipped.
    MissingSource,
}

/// Why a unit was found stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaleReason {
    /// The unit's build flag forces a rebuild.
    Forced,
    /// No derived artifact exists.
    ObjectMissing,
    /// The source file is newer than the artifact.
    SourceNewer,
    /// A recorded dependency is newer than the artifact.
    DependencyNewer(PathBuf),
    /// A recorded dependency no longer exists on disk.
    ///
    /// Treated as always-stale until the record is rescanned.
    DependencyMissing(PathBuf),
}

/// One file in the project.
///
/// Owned by exactly one [`Group`](crate::group::Group); moving a unit
/// between groups transfers the value, never copies it.
#[derive(Clone, Debug)]
pub struct SourceUnit {
    id: UnitId,
    rel_path: PathBuf,
    kind: SourceKind,
    build_flag: BuildFlag,
    deps: Option<DependencyRecord>,
}

impl SourceUnit {
    /// Creates a unit for a project-relative path, resolving its kind.
    pub fn new(id: UnitId, path: impl Into<PathBuf>) -> Self {
        let rel_path = path.into();
        let kind = SourceKind::from_path(&rel_path);
        Self {
            id,
            rel_path,
            kind,
            build_flag: BuildFlag::default(),
            deps: None,
        }
    }

    /// The unit's stable id.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// The project-relative path of the source file.
    pub fn path(&self) -> &Path {
        &self.rel_path
    }

    /// The unit's kind.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The current build flag.
    pub fn build_flag(&self) -> BuildFlag {
        self.build_flag
    }

    /// Sets the build flag.
    pub fn set_build_flag(&mut self, flag: BuildFlag) {
        self.build_flag = flag;
    }

    /// The cached dependency record, if one has been scanned.
    pub fn deps(&self) -> Option<&DependencyRecord> {
        self.deps.as_ref()
    }

    /// Replaces the cached dependency record.
    pub fn set_deps(&mut self, record: DependencyRecord) {
        self.deps = Some(record);
    }

    /// The file name for display purposes.
    pub fn file_name(&self) -> String {
        self.rel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.rel_path.display().to_string())
    }

    /// The absolute path of the source file under a project root.
    pub fn abs_path(&self, root: &Path) -> PathBuf {
        if self.rel_path.is_absolute() {
            self.rel_path.clone()
        } else {
            root.join(&self.rel_path)
        }
    }

    /// Whether this unit takes part in a build pass.
    pub fn participates_in_build(&self) -> bool {
        self.kind.participates_in_build()
    }

    /// The derived artifact path, for kinds that compile.
    pub fn object_path(&self, ctx: &BuildContext) -> Option<PathBuf> {
        let ext = self.kind.artifact_extension()?;
        let stem = self.rel_path.file_stem()?.to_string_lossy();
        Some(ctx.object_dir.join(format!("{stem}.{ext}")))
    }

    /// The artifact this unit contributes to the resource-merge step.
    ///
    /// Resource definitions contribute their compiled output; already
    /// compiled resources contribute themselves.
    pub fn merge_artifact(&self, ctx: &BuildContext) -> Option<PathBuf> {
        match self.kind {
            SourceKind::ResourceDef => self.object_path(ctx),
            SourceKind::ResourceCompiled => Some(self.abs_path(&ctx.project_root)),
            _ => None,
        }
    }

    /// Checks whether the unit needs building under the given context.
    ///
    /// The derived artifact must exist and be at least as new as the source
    /// file; with `check_deps`, it must also be at least as new as every
    /// path in the dependency record. A recorded dependency missing from
    /// disk makes the unit stale until the record is rescanned. A missing
    /// source file is reported as [`Freshness::MissingSource`], never
    /// silently mapped to stale or fresh.
    pub fn freshness(&self, ctx: &BuildContext, check_deps: bool) -> Freshness {
        let source = self.abs_path(&ctx.project_root);
        let Some(source_mtime) = mtime(&source) else {
            return Freshness::MissingSource;
        };

        // Kinds without a derived artifact have nothing to rebuild.
        let Some(object) = self.object_path(ctx) else {
            return Freshness::UpToDate;
        };

        if self.build_flag == BuildFlag::Forced {
            return Freshness::Stale(StaleReason::Forced);
        }
        let Some(object_mtime) = mtime(&object) else {
            return Freshness::Stale(StaleReason::ObjectMissing);
        };

        if source_mtime > object_mtime {
            return Freshness::Stale(StaleReason::SourceNewer);
        }

        if check_deps {
            if let Some(record) = &self.deps {
                for dep in record.paths() {
                    match mtime(dep) {
                        None => {
                            return Freshness::Stale(StaleReason::DependencyMissing(
                                dep.to_path_buf(),
                            ))
                        }
                        Some(t) if t > object_mtime => {
                            return Freshness::Stale(StaleReason::DependencyNewer(
                                dep.to_path_buf(),
                            ))
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        Freshness::UpToDate
    }

    /// Convenience wrapper: `true` when [`freshness`](Self::freshness) is stale.
    pub fn needs_build(&self, ctx: &BuildContext, check_deps: bool) -> bool {
        matches!(self.freshness(ctx, check_deps), Freshness::Stale(_))
    }

    /// Derives the toolchain command that compiles this unit.
    ///
    /// Returns `None` for kinds that do not compile. The command is a pure
    /// description; execution and failure capture happen in the build crate.
    pub fn compile_job(&self, ctx: &BuildContext) -> Option<ToolInvocation> {
        let object = self.object_path(ctx)?;
        let source = self.abs_path(&ctx.project_root);

        match self.kind {
            SourceKind::C | SourceKind::Cpp => {
                let mut args = vec!["-c".to_string()];
                args.extend(ctx.flags.iter().cloned());
                for dir in &ctx.include_dirs {
                    args.push(format!("-I{}", dir.display()));
                }
                args.push(source.display().to_string());
                args.push("-o".to_string());
                args.push(object.display().to_string());
                Some(ToolInvocation::new(&ctx.compiler, args))
            }
            SourceKind::ResourceDef => Some(ToolInvocation::new(
                &ctx.resource_compiler,
                vec![
                    "-o".to_string(),
                    object.display().to_string(),
                    source.display().to_string(),
                ],
            )),
            _ => None,
        }
    }

    /// Deletes the derived artifact if present. Idempotent.
    pub fn remove_object(&self, ctx: &BuildContext) -> std::io::Result<()> {
        let Some(object) = self.object_path(ctx) else {
            return Ok(());
        };
        match std::fs::remove_file(&object) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Stats a path's mtime; `None` when the file does not exist.
fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
