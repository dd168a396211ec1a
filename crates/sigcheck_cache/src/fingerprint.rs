//! Input fingerprinting for cache reuse.
//!
//! A cached signature is reusable only when every input it was built from
//! is unchanged: the declared signatures, the external classpath subset, the
//! exclude-class patterns, and the merge flag. Files are identified by
//! canonical path plus content hash, in declaration order. Directory entries
//! contribute every file beneath them, sorted by relative path.

use std::path::{Path, PathBuf};

use sigcheck_common::{ClassPattern, ContentHash, FileRef, Fingerprint};
use sigcheck_signature::SignatureRef;

use crate::error::CacheError;

/// Hashes the content of a single file with XXH3-128.
pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
    let content = std::fs::read(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(ContentHash::from_bytes(&content))
}

/// The tuple of inputs a cached signature is built from.
#[derive(Debug, Clone, Copy)]
pub struct CacheInputs<'a> {
    /// Declared signatures, in declaration order.
    pub signatures: &'a [SignatureRef],
    /// External (third-party) classpath entries, in classpath order.
    pub external_classpath: &'a [FileRef],
    /// Class patterns removed from the classpath scan.
    pub exclude_classes: &'a [ClassPattern],
    /// Whether signatures are merged into one.
    pub merge_signatures: bool,
}

impl CacheInputs<'_> {
    /// Computes the fingerprint of these inputs for `tool_version`.
    ///
    /// A directory is walked recursively and each file's relative path and
    /// content hash are included, so adding, removing, or editing a class
    /// file invalidates the cache. Unreadable files contribute their path
    /// and a marker instead of a content hash; the build itself reports
    /// unreadable signatures.
    pub fn fingerprint(&self, tool_version: &str) -> ContentHash {
        let mut fp = Fingerprint::new("sigcheck-cache");
        fp.str(tool_version).flag(self.merge_signatures);

        fp.str("signatures");
        for signature in self.signatures {
            fp.str(signature.coordinate.as_deref().unwrap_or(""));
            file_field(&mut fp, &signature.file);
        }

        fp.str("classpath");
        for entry in self.external_classpath {
            file_field(&mut fp, entry);
        }

        fp.str("exclude-classes");
        for pattern in self.exclude_classes {
            fp.str(pattern.as_str());
        }

        fp.finish()
    }
}

fn file_field(fp: &mut Fingerprint, file: &FileRef) {
    fp.str(&file.to_slash_string());
    let path = file.path();
    if !path.is_dir() {
        content_field(fp, path);
        return;
    }

    let mut files = Vec::new();
    collect_files(path, &mut files);
    files.sort();
    fp.str("dir").field(&(files.len() as u64).to_le_bytes());
    for child in &files {
        let relative = child.strip_prefix(path).unwrap_or(child);
        fp.str(&relative.to_string_lossy().replace('\\', "/"));
        content_field(fp, child);
    }
}

fn content_field(fp: &mut Fingerprint, path: &Path) {
    match path.is_file().then(|| hash_file(path).ok()).flatten() {
        Some(hash) => fp.str("file").hash(&hash),
        None => fp.str("unhashed"),
    };
}

/// Collects every non-directory entry under `dir`. Symlinked directories
/// are not descended into.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            collect_files(&entry.path(), out);
        } else {
            out.push(entry.path());
        }
    }
}
