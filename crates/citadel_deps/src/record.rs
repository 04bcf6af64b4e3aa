//! The per-unit record of transitive dependencies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The transitive dependency set of one source file.
///
/// Maps each resolved dependency path to the modification time observed
/// when the record was produced. A record is valid only until any file in
/// the set changes; staleness checks re-stat every path rather than
/// comparing against the stored times, which exist for inspection and
/// persistence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    entries: BTreeMap<PathBuf, SystemTime>,
}

impl DependencyRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dependency with the mtime observed for it.
    pub fn insert(&mut self, path: PathBuf, observed_mtime: SystemTime) {
        self.entries.insert(path, observed_mtime);
    }

    /// Returns `true` if `path` is in the dependency set.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterates over the dependency paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Iterates over `(path, observed mtime)` pairs in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (&Path, SystemTime)> {
        self.entries.iter().map(|(p, t)| (p.as_path(), *t))
    }

    /// Number of dependencies in the record.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no dependencies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
