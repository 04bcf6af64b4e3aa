//! Textual include scanning with transitive recursion.

use crate::error::DepsError;
use crate::record::DependencyRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// An include directive found in a source file.
#[derive(Debug, PartialEq, Eq)]
struct Include {
    name: String,
    /// Quoted includes search the including file's directory first.
    quoted: bool,
}

/// Produces [`DependencyRecord`]s by scanning include directives.
///
/// The scan is purely textual: no preprocessing, no macro expansion.
/// Conditional includes whose target is a macro, and includes naming files
/// outside the search paths, are skipped. The scanner cannot prove a file
/// does not exist somewhere else, so it never fails on them.
pub struct DependencyTracker;

impl DependencyTracker {
    /// Scans `path` and everything it transitively includes.
    ///
    /// Quoted includes resolve against the including file's directory first
    /// and then `search_paths` in order; angle includes use `search_paths`
    /// only. Recursion is cycle-safe via a visited set keyed by resolved
    /// absolute path. The returned record contains every resolved
    /// dependency but not `path` itself.
    pub fn scan(path: &Path, search_paths: &[PathBuf]) -> Result<DependencyRecord, DepsError> {
        let root = canonical(path);
        let content = std::fs::read_to_string(path).map_err(|source| DepsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut record = DependencyRecord::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(root.clone());

        // Worklist of (file path, its content); the root is pre-read so a
        // missing root fails the scan while missing includes never do.
        let mut worklist: Vec<(PathBuf, String)> = vec![(root, content)];

        while let Some((current, content)) = worklist.pop() {
            let current_dir = current.parent().map(Path::to_path_buf);

            for include in parse_includes(&content) {
                let Some(resolved) =
                    resolve_include(&include, current_dir.as_deref(), search_paths)
                else {
                    debug!(file = %current.display(), include = %include.name, "unresolved include skipped");
                    continue;
                };

                if !visited.insert(resolved.clone()) {
                    continue;
                }

                record.insert(resolved.clone(), observed_mtime(&resolved));

                match std::fs::read_to_string(&resolved) {
                    Ok(nested) => worklist.push((resolved, nested)),
                    Err(e) => {
                        debug!(file = %resolved.display(), error = %e, "dependency not readable, not recursing");
                    }
                }
            }
        }

        Ok(record)
    }
}

/// Extracts include directives from source text, one line at a time.
fn parse_includes(content: &str) -> Vec<Include> {
    let mut includes = Vec::new();

    for line in content.lines() {
        let line = line.trim_start();
        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix("include") else {
            continue;
        };
        let rest = rest.trim_start();

        let (closer, quoted) = match rest.chars().next() {
            Some('"') => ('"', true),
            Some('<') => ('>', false),
            // `#include MACRO_NAME` and malformed directives.
            _ => continue,
        };

        let body = &rest[1..];
        if let Some(end) = body.find(closer) {
            let name = &body[..end];
            if !name.is_empty() {
                includes.push(Include {
                    name: name.to_string(),
                    quoted,
                });
            }
        }
    }

    includes
}

/// Resolves an include name to a file, or `None` if nothing matches.
fn resolve_include(
    include: &Include,
    including_dir: Option<&Path>,
    search_paths: &[PathBuf],
) -> Option<PathBuf> {
    if include.quoted {
        if let Some(dir) = including_dir {
            let candidate = dir.join(&include.name);
            if candidate.is_file() {
                return Some(canonical(&candidate));
            }
        }
    }

    for dir in search_paths {
        let candidate = dir.join(&include.name);
        if candidate.is_file() {
            return Some(canonical(&candidate));
        }
    }

    None
}

/// Canonicalizes where possible, falling back to the path as given.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Stats a path's mtime, falling back to the epoch when stat fails.
fn observed_mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parse_quoted_and_angle() {
        let includes = parse_includes(
            "#include \"app.h\"\n#include <stdio.h>\n# include  \"spaced.h\"\n",
        );
        assert_eq!(includes.len(), 3);
        assert!(includes[0].quoted);
        assert_eq!(includes[0].name, "app.h");
        assert!(!includes[1].quoted);
        assert_eq!(includes[1].name, "stdio.h");
        assert_eq!(includes[2].name, "spaced.h");
    }

    #[test]
    fn parse_skips_macro_includes() {
        let includes = parse_includes("#include CONFIG_HEADER\n#define X 1\nint x;\n");
        assert!(includes.is_empty());
    }

    #[test]
    fn parse_skips_non_directives() {
        let includes = parse_includes("// #include \"commented.h\" is still scanned\nint y;\n");
        // Textual scanning does not strip comments; the directive must
        // start the line after whitespace.
        assert!(includes.is_empty());
    }

    #[test]
    fn scan_direct_include() {
        let tmp = TempDir::new().unwrap();
        let header = write(tmp.path(), "app.h", "int answer();\n");
        let source = write(tmp.path(), "app.cpp", "#include \"app.h\"\nint answer() { return 42; }\n");

        let record = DependencyTracker::scan(&source, &[]).unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.contains(&canonical(&header)));
    }

    #[test]
    fn scan_transitive_includes() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "c.h", "typedef int num;\n");
        let b = write(tmp.path(), "b.h", "#include \"c.h\"\n");
        let source = write(tmp.path(), "a.cpp", "#include \"b.h\"\n");

        let record = DependencyTracker::scan(&source, &[]).unwrap();
        assert_eq!(record.len(), 2);
        assert!(record.contains(&canonical(&b)));
        assert!(record.contains(&canonical(&tmp.path().join("c.h"))));
    }

    #[test]
    fn scan_survives_cycles() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "x.h", "#include \"y.h\"\n");
        write(tmp.path(), "y.h", "#include \"x.h\"\n");
        let source = write(tmp.path(), "main.c", "#include \"x.h\"\n");

        let record = DependencyTracker::scan(&source, &[]).unwrap();
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn angle_includes_use_search_paths_only() {
        let tmp = TempDir::new().unwrap();
        let incdir = tmp.path().join("include");
        write(&incdir, "lib.h", "void lib();\n");
        // Same-named header next to the source must NOT win for <...>.
        write(tmp.path(), "lib.h", "void local_decoy();\n");
        let source = write(tmp.path(), "main.c", "#include <lib.h>\n");

        let record = DependencyTracker::scan(&source, &[incdir.clone()]).unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.contains(&canonical(&incdir.join("lib.h"))));
    }

    #[test]
    fn quoted_includes_prefer_including_dir() {
        let tmp = TempDir::new().unwrap();
        let incdir = tmp.path().join("include");
        write(&incdir, "shared.h", "// search path copy\n");
        let local = write(tmp.path(), "shared.h", "// local copy\n");
        let source = write(tmp.path(), "main.c", "#include \"shared.h\"\n");

        let record = DependencyTracker::scan(&source, &[incdir]).unwrap();
        assert_eq!(record.len(), 1);
        assert!(record.contains(&canonical(&local)));
    }

    #[test]
    fn unresolvable_includes_skipped() {
        let tmp = TempDir::new().unwrap();
        let source = write(
            tmp.path(),
            "main.c",
            "#include <no_such_system_header.h>\n#include \"also_missing.h\"\n",
        );

        let record = DependencyTracker::scan(&source, &[]).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn missing_root_fails() {
        let err = DependencyTracker::scan(Path::new("/nope/missing.cpp"), &[]).unwrap_err();
        assert!(matches!(err, DepsError::Io { .. }));
    }

    #[test]
    fn duplicate_includes_deduplicated() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "once.h", "int x;\n");
        let source = write(
            tmp.path(),
            "main.c",
            "#include \"once.h\"\n#include \"once.h\"\n",
        );

        let record = DependencyTracker::scan(&source, &[]).unwrap();
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn record_excludes_scanned_file_itself() {
        let tmp = TempDir::new().unwrap();
        let source = write(tmp.path(), "self.c", "#include \"self.c\"\n");
        let record = DependencyTracker::scan(&source, &[]).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn observed_mtime_recorded() {
        let tmp = TempDir::new().unwrap();
        let header = write(tmp.path(), "t.h", "int t;\n");
        let source = write(tmp.path(), "t.c", "#include \"t.h\"\n");

        let record = DependencyTracker::scan(&source, &[]).unwrap();
        let (_, observed) = record.entries().next().unwrap();
        let actual = fs::metadata(&header).unwrap().modified().unwrap();
        assert_eq!(observed, actual);
    }
}
