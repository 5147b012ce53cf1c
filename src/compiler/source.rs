//! Where source files come from
//!
//! Parent contracts and imported declarations are read through a
//! [`SourceProvider`], so the same analysis runs against the file system or
//! an in-memory set of files.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Reads source text by path
pub trait SourceProvider {
    /// Full text of `path`
    fn read(&self, path: &str) -> Result<String>;

    /// Resolves an import specifier relative to the importing file
    ///
    /// `./base` imported from `contracts/token.ts` becomes
    /// `contracts/base.ts`; `..` segments are folded and a missing extension
    /// defaults to `.ts`.
    fn resolve(&self, from: &str, specifier: &str) -> String {
        let base = Path::new(from).parent().unwrap_or_else(|| Path::new(""));
        let mut parts: Vec<String> = Vec::new();
        for component in base.join(specifier).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if parts.last().map(|p| p != "..").unwrap_or(false) {
                        parts.pop();
                    } else {
                        parts.push("..".into());
                    }
                }
                Component::RootDir => parts.push(String::new()),
                other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
            }
        }
        let mut joined = parts.join("/");
        if Path::new(&joined).extension().is_none() {
            joined.push_str(".ts");
        }
        joined
    }
}

/// Whether an import specifier points at a local file
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Reads from the local file system
#[derive(Debug, Clone, Default)]
pub struct FsSourceProvider {
    root: Option<PathBuf>,
}

impl FsSourceProvider {
    /// Paths are used as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative paths are read below `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        FsSourceProvider {
            root: Some(root.into()),
        }
    }
}

impl SourceProvider for FsSourceProvider {
    fn read(&self, path: &str) -> Result<String> {
        let full = match &self.root {
            Some(root) if Path::new(path).is_relative() => root.join(path),
            _ => PathBuf::from(path),
        };
        std::fs::read_to_string(&full).map_err(|e| Error::SourceUnavailable {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Serves files from memory; used by tests and embedders
#[derive(Debug, Clone, Default)]
pub struct MemorySourceProvider {
    files: HashMap<String, String>,
}

impl MemorySourceProvider {
    /// Empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file
    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_file(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl SourceProvider for MemorySourceProvider {
    fn read(&self, path: &str) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::SourceUnavailable {
                path: path.to_string(),
                reason: "no such file".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_relative_specifiers() {
        let p = MemorySourceProvider::new();
        assert_eq!(p.resolve("contracts/token.ts", "./base"), "contracts/base.ts");
        assert_eq!(p.resolve("contracts/token.ts", "../lib/base.ts"), "lib/base.ts");
        assert_eq!(p.resolve("token.ts", "./base"), "base.ts");
    }

    #[test]
    fn test_memory_provider_missing_file() {
        let p = MemorySourceProvider::new().with_file("a.ts", "x");
        assert_eq!(p.read("a.ts").unwrap(), "x");
        assert!(matches!(
            p.read("b.ts"),
            Err(Error::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_fs_provider_with_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("base.ts")).unwrap();
        writeln!(file, "@Contract export class Base {{ }}").unwrap();
        let p = FsSourceProvider::with_root(dir.path());
        assert!(p.read("base.ts").unwrap().contains("Base"));
        assert!(p.read("missing.ts").is_err());
    }

    #[test]
    fn test_relative_detection() {
        assert!(is_relative("./a"));
        assert!(is_relative("../a"));
        assert!(!is_relative("@stylus/sdk"));
    }
}
