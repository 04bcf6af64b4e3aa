//! The closed enumeration of source file kinds.

use std::path::Path;

/// What kind of file a source unit is, resolved once from its extension.
///
/// The set is closed: build behavior dispatches on this tag rather than on
/// an open-ended type hierarchy. Unknown extensions become [`Opaque`]
/// units, which load fine and never participate in a build.
///
/// [`Opaque`]: SourceKind::Opaque
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A C translation unit (`.c`).
    C,
    /// A C++ translation unit (`.cpp`, `.cc`, `.cxx`, `.c++`).
    Cpp,
    /// A C or C++ header (`.h`, `.hpp`, `.hxx`, `.h++`).
    Header,
    /// A resource definition compiled into a `.rsrc` (`.rdef`).
    ResourceDef,
    /// An already-compiled resource file (`.rsrc`).
    ResourceCompiled,
    /// Anything else; carried in the project but never built.
    Opaque,
}

impl SourceKind {
    /// Resolves the kind from a file path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return SourceKind::Opaque;
        };
        match ext.to_ascii_lowercase().as_str() {
            "c" => SourceKind::C,
            "cpp" | "cc" | "cxx" | "c++" => SourceKind::Cpp,
            "h" | "hpp" | "hxx" | "h++" => SourceKind::Header,
            "rdef" => SourceKind::ResourceDef,
            "rsrc" => SourceKind::ResourceCompiled,
            _ => SourceKind::Opaque,
        }
    }

    /// Whether units of this kind take part in a build pass at all.
    pub fn participates_in_build(self) -> bool {
        matches!(
            self,
            SourceKind::C | SourceKind::Cpp | SourceKind::ResourceDef | SourceKind::ResourceCompiled
        )
    }

    /// Whether units of this kind produce a derived artifact to compile.
    pub fn compiles(self) -> bool {
        matches!(self, SourceKind::C | SourceKind::Cpp | SourceKind::ResourceDef)
    }

    /// Whether units of this kind are linked into the binary as objects.
    pub fn links(self) -> bool {
        matches!(self, SourceKind::C | SourceKind::Cpp)
    }

    /// Whether include scanning applies to units of this kind.
    pub fn scans_includes(self) -> bool {
        matches!(self, SourceKind::C | SourceKind::Cpp | SourceKind::Header)
    }

    /// Extension of the derived artifact, for kinds that compile.
    pub fn artifact_extension(self) -> Option<&'static str> {
        match self {
            SourceKind::C | SourceKind::Cpp => Some("o"),
            SourceKind::ResourceDef => Some("rsrc"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_family_extensions() {
        assert_eq!(SourceKind::from_path(Path::new("a.c")), SourceKind::C);
        assert_eq!(SourceKind::from_path(Path::new("a.cpp")), SourceKind::Cpp);
        assert_eq!(SourceKind::from_path(Path::new("a.cc")), SourceKind::Cpp);
        assert_eq!(SourceKind::from_path(Path::new("a.cxx")), SourceKind::Cpp);
        assert_eq!(SourceKind::from_path(Path::new("a.c++")), SourceKind::Cpp);
    }

    #[test]
    fn header_extensions() {
        for name in ["a.h", "a.hpp", "a.hxx", "a.h++"] {
            assert_eq!(SourceKind::from_path(Path::new(name)), SourceKind::Header);
        }
    }

    #[test]
    fn resource_extensions() {
        assert_eq!(
            SourceKind::from_path(Path::new("app.rdef")),
            SourceKind::ResourceDef
        );
        assert_eq!(
            SourceKind::from_path(Path::new("app.rsrc")),
            SourceKind::ResourceCompiled
        );
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(SourceKind::from_path(Path::new("A.CPP")), SourceKind::Cpp);
        assert_eq!(SourceKind::from_path(Path::new("x.RDef")), SourceKind::ResourceDef);
    }

    #[test]
    fn unknown_extensions_are_opaque() {
        assert_eq!(SourceKind::from_path(Path::new("readme.txt")), SourceKind::Opaque);
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), SourceKind::Opaque);
        assert_eq!(SourceKind::from_path(Path::new("noext")), SourceKind::Opaque);
    }

    #[test]
    fn participation_table() {
        assert!(SourceKind::C.participates_in_build());
        assert!(SourceKind::Cpp.participates_in_build());
        assert!(SourceKind::ResourceDef.participates_in_build());
        assert!(SourceKind::ResourceCompiled.participates_in_build());
        assert!(!SourceKind::Header.participates_in_build());
        assert!(!SourceKind::Opaque.participates_in_build());
    }

    #[test]
    fn compiled_resources_do_not_compile_but_participate() {
        assert!(!SourceKind::ResourceCompiled.compiles());
        assert!(SourceKind::ResourceCompiled.participates_in_build());
    }

    #[test]
    fn only_translation_units_link() {
        assert!(SourceKind::C.links());
        assert!(SourceKind::Cpp.links());
        assert!(!SourceKind::ResourceDef.links());
        assert!(!SourceKind::Header.links());
    }

    #[test]
    fn artifact_extensions() {
        assert_eq!(SourceKind::Cpp.artifact_extension(), Some("o"));
        assert_eq!(SourceKind::ResourceDef.artifact_extension(), Some("rsrc"));
        assert_eq!(SourceKind::Header.artifact_extension(), None);
    }
}
