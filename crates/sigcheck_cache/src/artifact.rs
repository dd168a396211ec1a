//! Per-unit cache artifact storage.
//!
//! Each compilation unit owns exactly one file, `<cache_dir>/<unit>.sigcache`.
//! The file starts with a header containing magic bytes, format version, the
//! fingerprint of the inputs it was built from, and a payload checksum.
//! Writes go to a temporary file in the same directory and are renamed into
//! place, so readers see either the old artifact or the new one, never a
//! partial write.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sigcheck_common::ContentHash;

use crate::error::CacheError;

/// Magic bytes identifying a sigcheck cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"SGCK";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File extension for cache artifacts.
pub const CACHE_EXT: &str = "sigcache";

/// Header prepended to every cache artifact for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"SGCK"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// Tool version that produced this artifact.
    pub tool_version: String,

    /// Fingerprint of the inputs the payload was built from.
    pub inputs: ContentHash,

    /// Content hash of the payload data (for integrity checks).
    pub checksum: ContentHash,
}

/// Store for per-unit cache artifacts.
pub struct ArtifactStore {
    /// Root cache directory.
    cache_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a new artifact store rooted at the given cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Returns the root cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Ensures that the cache directory exists.
    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::Io {
            path: self.cache_dir.clone(),
            source: e,
        })
    }

    /// Returns the file path of the artifact for `unit`.
    pub fn artifact_path(&self, unit: &str) -> PathBuf {
        self.cache_dir.join(format!("{unit}.{CACHE_EXT}"))
    }

    /// Writes the artifact for `unit`, replacing any previous one atomically.
    pub fn write_artifact(
        &self,
        unit: &str,
        inputs: ContentHash,
        data: &[u8],
        tool_version: &str,
    ) -> Result<PathBuf, CacheError> {
        self.ensure_dir()?;
        let path = self.artifact_path(unit);

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
            inputs,
            checksum: ContentHash::from_bytes(data),
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // Layout: 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir).map_err(io_err)?;
        tmp.write_all(&output).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        Ok(path)
    }

    /// Reads and validates the header of the artifact for `unit`.
    ///
    /// Returns `None` if the file is missing or its header is unreadable,
    /// has the wrong magic, or has a different format version.
    pub fn read_header(&self, unit: &str) -> Option<ArtifactHeader> {
        let raw = std::fs::read(self.artifact_path(unit)).ok()?;
        split_artifact(&raw).map(|(header, _)| header)
    }

    /// Reads the payload of the artifact for `unit`.
    ///
    /// Returns `None` if the file doesn't exist, the header is invalid, the
    /// format version doesn't match, the checksum doesn't verify, or the
    /// artifact was built from inputs other than `expected_inputs`. This is
    /// fail-safe: corruption results in a cache miss.
    pub fn read_artifact(&self, unit: &str, expected_inputs: &ContentHash) -> Option<Vec<u8>> {
        let raw = std::fs::read(self.artifact_path(unit)).ok()?;
        let (header, payload) = split_artifact(&raw)?;

        if header.inputs != *expected_inputs {
            return None;
        }
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }

        Some(payload.to_vec())
    }

    /// Removes the artifact for `unit`. Returns `true` if a file was removed.
    pub fn remove(&self, unit: &str) -> Result<bool, CacheError> {
        let path = self.artifact_path(unit);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Removes artifacts of units not in `live_units`.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self, live_units: &[&str]) -> Result<usize, CacheError> {
        let dir = &self.cache_dir;
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = std::fs::read_dir(dir).map_err(|e| CacheError::Io {
            path: dir.clone(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(CACHE_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !live_units.contains(&stem) {
                        std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                            path: path.clone(),
                            source: e,
                        })?;
                        removed += 1;
                    }
                }
            }
        }

        Ok(removed)
    }
}

/// Splits a raw artifact into its validated header and payload.
fn split_artifact(raw: &[u8]) -> Option<(ArtifactHeader, &[u8])> {
    // Need at least 4 bytes for the header length
    if raw.len() < 4 {
        return None;
    }

    let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
    if raw.len() < 4 + header_len {
        return None;
    }

    let header: ArtifactHeader =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
            .ok()?
            .0;

    if header.magic != ARTIFACT_MAGIC || header.format_version != ARTIFACT_FORMAT_VERSION {
        return None;
    }

    Some((header, &raw[4 + header_len..]))
}
