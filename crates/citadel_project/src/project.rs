//! The project: ordered groups, structural operations, persistence.

use crate::error::ProjectError;
use crate::group::Group;
use crate::unit::{BuildFlag, SourceUnit, UnitId};
use citadel_config::{
    load_config, save_config, BuildContext, GroupConfig, ProjectConfig,
};
use citadel_deps::DependencyTracker;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the group created when a project file lists none.
const DEFAULT_GROUP: &str = "Source files";

/// One open project: the unit of everything the orchestrator builds.
///
/// Structure is mutated only between build passes by whoever owns the
/// project (the session); the orchestrator snapshots unit state before
/// dispatching and writes flags back afterwards.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    groups: Vec<Group>,
    needs_full_rebuild: bool,
    next_unit: u32,
}

impl Project {
    /// Loads the project from `<root>/citadel.toml`.
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let config = load_config(root)?;
        Ok(Self::from_config(config, root))
    }

    /// Builds the runtime model from a parsed configuration.
    ///
    /// A project always has at least one group; if the file lists none, a
    /// default group is created.
    pub fn from_config(config: ProjectConfig, root: &Path) -> Self {
        let mut next_unit = 0u32;
        let mut groups: Vec<Group> = config
            .groups
            .iter()
            .map(|gc| {
                let mut group = Group::new(&gc.name);
                for file in &gc.files {
                    group.push(SourceUnit::new(UnitId::from_raw(next_unit), file));
                    next_unit += 1;
                }
                group
            })
            .collect();

        if groups.is_empty() {
            groups.push(Group::new(DEFAULT_GROUP));
        }

        Self {
            root: root.to_path_buf(),
            config,
            groups,
            needs_full_rebuild: false,
            next_unit,
        }
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The project name.
    pub fn name(&self) -> &str {
        &self.config.project.name
    }

    /// The parsed configuration backing this project.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Whether the project refuses to write itself back to disk.
    pub fn read_only(&self) -> bool {
        self.config.project.read_only
    }

    /// Whether the project builds with debugging information.
    pub fn debug_build(&self) -> bool {
        self.config.project.debug
    }

    /// Toggles the debug flag.
    ///
    /// Changing it alters the build context, so every unit needs a rebuild.
    pub fn set_debug_build(&mut self, debug: bool) {
        if self.config.project.debug != debug {
            self.config.project.debug = debug;
            self.force_rebuild();
        }
    }

    /// Whether the next pass must rebuild everything.
    pub fn needs_full_rebuild(&self) -> bool {
        self.needs_full_rebuild
    }

    /// Marks every participating unit as forced and the project as needing
    /// a full rebuild.
    pub fn force_rebuild(&mut self) {
        self.needs_full_rebuild = true;
        for unit in self.units_mut() {
            if unit.participates_in_build() {
                unit.set_build_flag(BuildFlag::Forced);
            }
        }
    }

    /// Clears the full-rebuild flag after a successful pass.
    pub fn clear_full_rebuild(&mut self) {
        self.needs_full_rebuild = false;
    }

    /// Resolves the build context for the next pass.
    pub fn build_context(&self) -> BuildContext {
        BuildContext::resolve(&self.config, &self.root)
    }

    // -- group operations --

    /// The groups, in order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Adds a new empty group at the end.
    pub fn add_group(&mut self, name: impl Into<String>) -> Result<(), ProjectError> {
        let name = name.into();
        if self.groups.iter().any(|g| g.name() == name) {
            return Err(ProjectError::DuplicateGroup(name));
        }
        self.groups.push(Group::new(name));
        Ok(())
    }

    /// Renames a group.
    pub fn rename_group(&mut self, from: &str, to: impl Into<String>) -> Result<(), ProjectError> {
        let to = to.into();
        if self.groups.iter().any(|g| g.name() == to) {
            return Err(ProjectError::DuplicateGroup(to));
        }
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.name() == from)
            .ok_or_else(|| ProjectError::UnknownGroup(from.to_string()))?;
        group.rename(to);
        Ok(())
    }

    /// Drops every emptied group, always keeping the last remaining one.
    pub fn cull_empty_groups(&mut self) {
        let mut kept: Vec<Group> = Vec::with_capacity(self.groups.len());
        for group in self.groups.drain(..) {
            if !group.is_empty() {
                kept.push(group);
            }
        }
        if kept.is_empty() {
            kept.push(Group::new(DEFAULT_GROUP));
        }
        self.groups = kept;
    }

    // -- unit operations --

    /// Adds a file to the named group (or the last group when `None`).
    ///
    /// The path is stored as given; duplicates are rejected. The new unit
    /// starts with the default needs-build flag.
    pub fn add_file(
        &mut self,
        path: impl Into<PathBuf>,
        group: Option<&str>,
    ) -> Result<UnitId, ProjectError> {
        let path = path.into();
        if self.unit_by_path(&path).is_some() {
            return Err(ProjectError::DuplicateFile(path));
        }

        let id = UnitId::from_raw(self.next_unit);
        let unit = SourceUnit::new(id, path);

        let group = match group {
            Some(name) => self
                .groups
                .iter_mut()
                .find(|g| g.name() == name)
                .ok_or_else(|| ProjectError::UnknownGroup(name.to_string()))?,
            None => {
                // A project always has at least one group.
                if self.groups.is_empty() {
                    self.groups.push(Group::new(DEFAULT_GROUP));
                }
                let last = self.groups.len() - 1;
                &mut self.groups[last]
            }
        };
        group.push(unit);
        self.next_unit += 1;
        Ok(id)
    }

    /// Removes a unit from the project, returning it.
    ///
    /// Emptied groups are culled (except the last). The caller decides
    /// whether to delete the unit's derived artifact via
    /// [`SourceUnit::remove_object`].
    pub fn remove_unit(&mut self, id: UnitId) -> Result<SourceUnit, ProjectError> {
        let unit = self
            .groups
            .iter_mut()
            .find_map(|g| g.remove(id))
            .ok_or(ProjectError::UnknownUnit(id))?;
        self.cull_empty_groups();
        Ok(unit)
    }

    /// Moves a unit to another group, transferring ownership of the value.
    ///
    /// `index` positions the unit within the target group; `None` appends.
    pub fn move_unit(
        &mut self,
        id: UnitId,
        to_group: &str,
        index: Option<usize>,
    ) -> Result<(), ProjectError> {
        let target = self
            .groups
            .iter()
            .position(|g| g.name() == to_group)
            .ok_or_else(|| ProjectError::UnknownGroup(to_group.to_string()))?;
        let unit = self
            .groups
            .iter_mut()
            .find_map(|g| g.remove(id))
            .ok_or(ProjectError::UnknownUnit(id))?;

        match index {
            Some(i) => self.groups[target].insert(i, unit),
            None => self.groups[target].push(unit),
        }
        self.cull_empty_groups();
        Ok(())
    }

    /// Looks up a unit by id.
    pub fn unit(&self, id: UnitId) -> Option<&SourceUnit> {
        self.units().find(|u| u.id() == id)
    }

    /// Looks up a unit mutably by id.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut SourceUnit> {
        self.units_mut().find(|u| u.id() == id)
    }

    /// Looks up a unit by its stored path.
    pub fn unit_by_path(&self, path: &Path) -> Option<&SourceUnit> {
        self.units().find(|u| u.path() == path)
    }

    /// Iterates all units in group order.
    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.groups.iter().flat_map(|g| g.units().iter())
    }

    /// Iterates all units mutably in group order.
    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut SourceUnit> {
        self.groups.iter_mut().flat_map(|g| g.units_mut().iter_mut())
    }

    /// Number of units across all groups.
    pub fn unit_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Flags one unit for rebuild and deletes its derived artifact.
    pub fn mark_unit_for_rebuild(
        &mut self,
        id: UnitId,
        ctx: &BuildContext,
    ) -> Result<(), ProjectError> {
        let root = self.root.clone();
        let unit = self.unit_mut(id).ok_or(ProjectError::UnknownUnit(id))?;
        if unit.participates_in_build() {
            unit.remove_object(ctx).map_err(|source| ProjectError::Io {
                path: unit.abs_path(&root),
                source,
            })?;
            unit.set_build_flag(BuildFlag::Forced);
        }
        Ok(())
    }

    /// Rescans dependency records for every include-bearing unit.
    ///
    /// Units whose source cannot be read are skipped (preflight reports
    /// them as missing when a build is attempted). Returns the number of
    /// units scanned.
    pub fn update_dependencies(&mut self, search_paths: &[PathBuf]) -> usize {
        let root = self.root.clone();
        let mut scanned = 0;
        for unit in self.units_mut() {
            if !unit.kind().scans_includes() {
                continue;
            }
            let abs = unit.abs_path(&root);
            match DependencyTracker::scan(&abs, search_paths) {
                Ok(record) => {
                    unit.set_deps(record);
                    scanned += 1;
                }
                Err(e) => {
                    debug!(file = %abs.display(), error = %e, "dependency scan skipped");
                }
            }
        }
        scanned
    }

    // -- persistence --

    /// Writes the project structure back to `citadel.toml`.
    ///
    /// Read-only projects skip the write silently, matching how projects
    /// opened from read-only media behave.
    pub fn save(&self) -> Result<(), ProjectError> {
        if self.read_only() {
            debug!(project = self.name(), "read-only project, save skipped");
            return Ok(());
        }
        let mut config = self.config.clone();
        config.groups = self
            .groups
            .iter()
            .map(|g| GroupConfig {
                name: g.name().to_string(),
                files: g
                    .units()
                    .iter()
                    .map(|u| u.path().to_string_lossy().into_owned())
                    .collect(),
            })
            .collect();
        save_config(&config, &self.root)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citadel_config::load_config_from_str;
    use std::fs;
    use tempfile::TempDir;

    fn make_project(root: &Path) -> Project {
        let config = load_config_from_str(
            r#"
[project]
name = "app"
version = "0.1.0"

[[groups]]
name = "Sources"
files = ["src/main.cpp", "src/window.cpp"]

[[groups]]
name = "Resources"
files = ["res/app.rdef"]
"#,
        )
        .unwrap();
        Project::from_config(config, root)
    }

    #[test]
    fn from_config_builds_groups_and_units() {
        let tmp = TempDir::new().unwrap();
        let project = make_project(tmp.path());
        assert_eq!(project.groups().len(), 2);
        assert_eq!(project.unit_count(), 3);
        assert_eq!(project.groups()[0].name(), "Sources");
        assert!(project.unit_by_path(Path::new("src/main.cpp")).is_some());
    }

    #[test]
    fn empty_config_gets_default_group() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_from_str(
            "[project]\nname = \"x\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        let project = Project::from_config(config, tmp.path());
        assert_eq!(project.groups().len(), 1);
        assert_eq!(project.groups()[0].name(), DEFAULT_GROUP);
    }

    #[test]
    fn add_file_appends_to_last_group() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        let id = project.add_file("src/new.cpp", None).unwrap();
        assert!(project.groups()[1].contains(id));
    }

    #[test]
    fn add_file_to_named_group() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        let id = project.add_file("src/new.cpp", Some("Sources")).unwrap();
        assert!(project.groups()[0].contains(id));
    }

    #[test]
    fn add_duplicate_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        let err = project.add_file("src/main.cpp", None).unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateFile(_)));
    }

    #[test]
    fn add_file_to_unknown_group_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        let err = project.add_file("x.cpp", Some("Nope")).unwrap_err();
        assert!(matches!(err, ProjectError::UnknownGroup(_)));
    }

    #[test]
    fn remove_unit_culls_emptied_group() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        let id = project.unit_by_path(Path::new("res/app.rdef")).unwrap().id();
        project.remove_unit(id).unwrap();
        assert_eq!(project.groups().len(), 1);
        assert_eq!(project.groups()[0].name(), "Sources");
    }

    #[test]
    fn last_group_never_culled() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_from_str(
            r#"
[project]
name = "x"
version = "0.1.0"

[[groups]]
name = "Only"
files = ["a.c"]
"#,
        )
        .unwrap();
        let mut project = Project::from_config(config, tmp.path());
        let id = project.unit_by_path(Path::new("a.c")).unwrap().id();
        project.remove_unit(id).unwrap();
        assert_eq!(project.groups().len(), 1);
        assert_eq!(project.unit_count(), 0);
    }

    #[test]
    fn move_unit_transfers_between_groups() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        let id = project.unit_by_path(Path::new("src/main.cpp")).unwrap().id();
        project.move_unit(id, "Resources", Some(0)).unwrap();
        assert!(project.groups().iter().any(|g| g.name() == "Resources" && g.contains(id)));
        assert_eq!(project.unit_count(), 3);
    }

    #[test]
    fn move_to_unknown_group_leaves_unit_in_place() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        let id = project.unit_by_path(Path::new("src/main.cpp")).unwrap().id();
        assert!(project.move_unit(id, "Nope", None).is_err());
        assert!(project.groups()[0].contains(id));
    }

    #[test]
    fn force_rebuild_flags_participating_units() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        project.force_rebuild();
        assert!(project.needs_full_rebuild());
        for unit in project.units() {
            if unit.participates_in_build() {
                assert_eq!(unit.build_flag(), BuildFlag::Forced);
            }
        }
    }

    #[test]
    fn set_debug_build_forces_rebuild() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        project.set_debug_build(true);
        assert!(project.needs_full_rebuild());
        // Setting the same value again is a no-op.
        project.clear_full_rebuild();
        project.set_debug_build(true);
        assert!(!project.needs_full_rebuild());
    }

    #[test]
    fn group_rename_and_duplicate_rejection() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        project.rename_group("Resources", "Assets").unwrap();
        assert!(project.groups().iter().any(|g| g.name() == "Assets"));
        let err = project.rename_group("Sources", "Assets").unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateGroup(_)));
    }

    #[test]
    fn save_and_reopen_preserves_structure() {
        let tmp = TempDir::new().unwrap();
        let mut project = make_project(tmp.path());
        project.add_file("src/extra.cpp", Some("Sources")).unwrap();
        project.save().unwrap();

        let reopened = Project::open(tmp.path()).unwrap();
        assert_eq!(reopened.unit_count(), 4);
        assert!(reopened.unit_by_path(Path::new("src/extra.cpp")).is_some());
        assert_eq!(reopened.groups().len(), 2);
    }

    #[test]
    fn read_only_project_skips_save() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_from_str(
            r#"
[project]
name = "x"
version = "0.1.0"
read_only = true
"#,
        )
        .unwrap();
        let project = Project::from_config(config, tmp.path());
        project.save().unwrap();
        assert!(!tmp.path().join("citadel.toml").exists());
    }

    #[test]
    fn update_dependencies_scans_sources() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/main.cpp"), "#include \"main.h\"\n").unwrap();
        fs::write(tmp.path().join("src/main.h"), "int main();\n").unwrap();

        let config = load_config_from_str(
            r#"
[project]
name = "x"
version = "0.1.0"

[[groups]]
name = "Sources"
files = ["src/main.cpp", "missing.cpp"]
"#,
        )
        .unwrap();
        let mut project = Project::from_config(config, tmp.path());
        let scanned = project.update_dependencies(&[]);
        assert_eq!(scanned, 1);

        let unit = project.unit_by_path(Path::new("src/main.cpp")).unwrap();
        assert_eq!(unit.deps().unwrap().len(), 1);
    }

    #[test]
    fn mark_unit_for_rebuild_flags_and_clears_object() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/main.cpp"), "int main() {}\n").unwrap();

        let mut project = make_project(tmp.path());
        let ctx = project.build_context();
        fs::create_dir_all(&ctx.object_dir).unwrap();
        fs::write(ctx.object_dir.join("main.o"), "obj").unwrap();

        let id = project.unit_by_path(Path::new("src/main.cpp")).unwrap().id();
        project.mark_unit_for_rebuild(id, &ctx).unwrap();

        assert!(!ctx.object_dir.join("main.o").exists());
        let unit = project.unit(id).unwrap();
        assert_eq!(unit.build_flag(), BuildFlag::Forced);
    }

    #[test]
    fn removing_unit_leaves_sibling_staleness_unaffected() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/main.cpp"), "int main() {}\n").unwrap();
        fs::write(tmp.path().join("src/window.cpp"), "void w() {}\n").unwrap();
        fs::create_dir_all(tmp.path().join("res")).unwrap();
        fs::write(tmp.path().join("res/app.rdef"), "resource app\n").unwrap();

        let mut project = make_project(tmp.path());
        let ctx = project.build_context();
        fs::create_dir_all(&ctx.object_dir).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        fs::write(ctx.object_dir.join("window.o"), "obj").unwrap();

        let id = project.unit_by_path(Path::new("src/main.cpp")).unwrap().id();
        let removed = project.remove_unit(id).unwrap();
        removed.remove_object(&ctx).unwrap();

        let sibling = project.unit_by_path(Path::new("src/window.cpp")).unwrap();
        assert_eq!(sibling.freshness(&ctx, true), crate::unit::Freshness::UpToDate);
    }
}
