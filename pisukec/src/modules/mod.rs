///
/// Module System
///
/// pisuke programs pull in other files with
/// `import { names } from "path"`. Two consumers share the same directive
/// scan, path resolution and once-per-file rule:
///
/// - inline: the textual inliner, splicing module text in place of each
///   directive and producing one flat source string
/// - loader: the module loader, parsing each file on its own and splicing
///   statements, so diagnostics keep per-file spans
///
/// Resolution of a directive path `p` seen in file `f`:
/// 1. `dir(f)/p`, with `.psk` appended when `p` has no extension
/// 2. otherwise `root/p` (same extension rule), where root is the
///    workspace root
///
/// Each physical file (by canonical path) is brought in at most once per
/// compilation; a repeated import expands to nothing. Cycles are cut the
/// same way, so the second file of a mutually importing pair does not see
/// the first one's definitions at its import site.
///

pub mod directive;
pub mod inline;
pub mod loader;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use directive::{blank_directives, scan_directives, ImportDirective};
pub use inline::{inline_imports, Inliner};
pub use loader::{LoadedProgram, ModuleLoader};

pub const SOURCE_EXTENSION: &str = "psk";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("module '{path}' not found (imported from {})", importer.display())]
    ModuleNotFound { path: String, importer: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Maps directive paths to files and remembers which files were taken.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    visited: HashSet<PathBuf>,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            visited: HashSet::new(),
        }
    }

    /// The file a directive path names, relative to the importing file.
    pub fn resolve(&self, importer: &Path, path: &str) -> ImportResult<PathBuf> {
        let relative = with_extension(path);
        let base = importer.parent().unwrap_or(Path::new("."));

        let local = base.join(&relative);
        if local.is_file() {
            return Ok(local);
        }
        let rooted = self.root.join(&relative);
        if rooted.is_file() {
            return Ok(rooted);
        }
        Err(ImportError::ModuleNotFound {
            path: path.to_string(),
            importer: importer.to_path_buf(),
        })
    }

    /// Record `file` as taken. Returns false when it already was.
    pub fn mark_visited(&mut self, file: &Path) -> ImportResult<bool> {
        let canonical = file.canonicalize().map_err(|source| ImportError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        Ok(self.visited.insert(canonical))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(".")
    }
}

fn with_extension(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(SOURCE_EXTENSION)
    }
}

pub(crate) fn read_module(path: &Path) -> ImportResult<String> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_relative_then_root() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(app.join("lib")).unwrap();
        fs::write(app.join("lib").join("math.psk"), "").unwrap();
        fs::create_dir_all(dir.path().join("std")).unwrap();
        fs::write(dir.path().join("std").join("web.psk"), "").unwrap();

        let resolver = Resolver::new(dir.path());
        let importer = app.join("main.psk");
        assert_eq!(
            resolver.resolve(&importer, "lib/math").unwrap(),
            app.join("lib").join("math.psk")
        );
        assert_eq!(
            resolver.resolve(&importer, "std/web.psk").unwrap(),
            dir.path().join("std").join("web.psk")
        );
        assert!(matches!(
            resolver.resolve(&importer, "missing"),
            Err(ImportError::ModuleNotFound { ref path, .. }) if path == "missing"
        ));
    }

    #[test]
    fn test_visited_uses_canonical_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        let file = dir.path().join("m.psk");
        fs::write(&file, "").unwrap();

        let mut resolver = Resolver::default();
        assert!(resolver.mark_visited(&file).unwrap());
        assert!(!resolver.mark_visited(&dir.path().join("a").join("..").join("m.psk")).unwrap());
        assert_eq!(resolver.visited_count(), 1);
    }
}
