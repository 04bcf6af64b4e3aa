//! Sidecar persistence of scanned dependency records.
//!
//! Dependency scanning is expensive, so records survive project reopen in a
//! small JSON file under the output directory. Loading is fail-safe: a
//! missing or corrupt state file simply means records start empty and the
//! next explicit scan repopulates them.

use crate::project::Project;
use citadel_deps::DependencyRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the sidecar state inside the output directory.
pub const STATE_FILE: &str = "citadel-state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    /// Dependency records keyed by each unit's stored path.
    records: BTreeMap<PathBuf, DependencyRecord>,
}

impl Project {
    /// Writes all cached dependency records to `<dir>/citadel-state.json`.
    pub fn save_state(&self, dir: &Path) -> std::io::Result<()> {
        let state = StateFile {
            records: self
                .units()
                .filter_map(|u| u.deps().map(|d| (u.path().to_path_buf(), d.clone())))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(STATE_FILE), json)
    }

    /// Restores dependency records from the sidecar state file.
    ///
    /// Records are matched to units by stored path; entries for files no
    /// longer in the project are dropped. Any read or parse problem leaves
    /// the project without records rather than failing the open.
    pub fn load_state(&mut self, dir: &Path) {
        let path = dir.join(STATE_FILE);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return;
        };
        let Ok(state) = serde_json::from_str::<StateFile>(&content) else {
            debug!(file = %path.display(), "unreadable state file ignored");
            return;
        };
        for unit in self.units_mut() {
            if let Some(record) = state.records.get(unit.path()) {
                unit.set_deps(record.clone());
            }
        }
    }
}
