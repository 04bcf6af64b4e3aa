//! The build-context fingerprint stamp.
//!
//! After a successful pass the context fingerprint is written next to the
//! object files. A later pass that resolves to a different fingerprint
//! (compiler swapped, flags changed, debug toggled) marks every unit as
//! needing rebuild, because existing objects were produced under different
//! settings. Reading is fail-safe: a missing or corrupt stamp simply means
//! a full rebuild.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::debug;

/// File name of the stamp inside the object directory.
pub const STAMP_FILE: &str = "context-stamp.json";

#[derive(Debug, Serialize, Deserialize)]
struct Stamp {
    fingerprint: u64,
}

/// Reads the fingerprint of the context that produced the current objects.
pub fn read_stamp(object_dir: &Path) -> Option<u64> {
    let content = std::fs::read_to_string(object_dir.join(STAMP_FILE)).ok()?;
    match serde_json::from_str::<Stamp>(&content) {
        Ok(stamp) => Some(stamp.fingerprint),
        Err(e) => {
            debug!(error = %e, "corrupt context stamp ignored");
            None
        }
    }
}

/// Writes the fingerprint after a successful pass.
pub fn write_stamp(object_dir: &Path, fingerprint: u64) -> io::Result<()> {
    let stamp = Stamp { fingerprint };
    let json = serde_json::to_string(&stamp)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::create_dir_all(object_dir)?;
    std::fs::write(object_dir.join(STAMP_FILE), json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn roundtrip() {
        let tmp = TempDir::new().unwrap();
        write_stamp(tmp.path(), 0xdead_beef).unwrap();
        assert_eq!(read_stamp(tmp.path()), Some(0xdead_beef));
    }

    #[test]
    fn missing_stamp_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_stamp(tmp.path()), None);
    }

    #[test]
    fn corrupt_stamp_is_none() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(STAMP_FILE), "{ nope").unwrap();
        assert_eq!(read_stamp(tmp.path()), None);
    }

    #[test]
    fn write_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("build/obj");
        write_stamp(&nested, 7).unwrap();
        assert_eq!(read_stamp(&nested), Some(7));
    }
}
