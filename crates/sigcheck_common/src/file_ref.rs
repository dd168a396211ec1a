//! Canonical filesystem references for classpath entries and artifacts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// An absolute, normalized path to a jar or class directory.
///
/// Identity is by canonical path: two `FileRef`s built from `lib/a.jar` and
/// `lib/../lib/a.jar` compare equal. When the path exists on disk it is
/// resolved through [`std::fs::canonicalize`] (following symlinks); otherwise
/// it is normalized lexically so that references to not-yet-built artifacts
/// still compare consistently. On Windows the comparison key is
/// additionally lowercased with `/` separators.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileRef {
    path: PathBuf,
}

impl FileRef {
    /// Creates a reference from `path`, resolving it against the current
    /// directory when relative.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        Self::from_absolute(&absolute)
    }

    /// Creates a reference from `path`, resolving it against `base` when
    /// relative.
    pub fn resolve(base: &Path, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_absolute() {
            Self::from_absolute(path)
        } else {
            Self::from_absolute(&base.join(path))
        }
    }

    fn from_absolute(path: &Path) -> Self {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| normalize_lexically(path));
        Self {
            path: fold_case(path),
        }
    }

    /// Returns the normalized path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the final path component as a string, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Returns `true` if this reference equals `other` or lies beneath it.
    ///
    /// Used to decide whether a classpath entry belongs to a module artifact,
    /// which may be either a single jar or a directory of classes.
    pub fn is_within(&self, other: &FileRef) -> bool {
        self.path.starts_with(&other.path)
    }

    /// Returns the path with `/` separators, for glob matching and display.
    pub fn to_slash_string(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileRef({})", self.path.display())
    }
}

/// Removes `.` components and folds `..` into the preceding component.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(windows)]
fn fold_case(path: PathBuf) -> PathBuf {
    let raw = path.to_string_lossy();
    let raw = raw.strip_prefix(r"\\?\").unwrap_or(&raw);
    PathBuf::from(raw.to_lowercase().replace('\\', "/"))
}

#[cfg(not(windows))]
fn fold_case(path: PathBuf) -> PathBuf {
    path
}
