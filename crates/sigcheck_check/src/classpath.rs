//! Classpath partitioning and file-level exclusion.
//!
//! Both operations preserve classpath order, which can affect symbol
//! resolution in the checking engine.

use std::borrow::Cow;

use globset::{GlobSet, GlobSetBuilder};
use sigcheck_common::FileRef;
use sigcheck_config::{compile_glob, ConfigError};

use crate::artifact_set::ArtifactSet;

/// A classpath split into local module outputs and third-party entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
    /// Entries produced by modules of this build, rescanned on every check.
    pub modules: Vec<FileRef>,
    /// Third-party entries, eligible for the cached signature.
    pub external: Cow<'a, [FileRef]>,
}

/// Splits `classpath` against the build's module artifacts.
///
/// With an empty artifact set the classpath is returned as the external
/// subset without copying.
pub fn partition<'a>(classpath: &'a [FileRef], artifacts: &ArtifactSet) -> Partition<'a> {
    if artifacts.is_empty() {
        return Partition {
            modules: Vec::new(),
            external: Cow::Borrowed(classpath),
        };
    }

    let (modules, external): (Vec<FileRef>, Vec<FileRef>) = classpath
        .iter()
        .cloned()
        .partition(|entry| artifacts.covers(entry));
    Partition {
        modules,
        external: Cow::Owned(external),
    }
}

/// Compiled file-exclusion globs.
///
/// A pattern matches a classpath entry when it matches the entry's full
/// path, or any trailing run of whole path components (`lombok-*.jar`
/// matches `/repo/lombok-1.18.jar`). `*` stays within one component; `**`
/// crosses directories.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    set: Option<GlobSet>,
}

impl ExcludePatterns {
    /// Compiles `patterns`, rejecting malformed globs.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        if patterns.is_empty() {
            return Ok(Self { set: None });
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let normalized = pattern.replace('\\', "/");
            builder.add(compile_glob(&normalized)?);
            if !normalized.starts_with('/') && !normalized.starts_with("**/") {
                builder.add(compile_glob(&format!("**/{normalized}"))?);
            }
        }
        let set = builder
            .build()
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        Ok(Self { set: Some(set) })
    }

    /// Returns `true` if no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.set.is_none()
    }

    /// Returns `true` if `entry` is excluded.
    pub fn matches(&self, entry: &FileRef) -> bool {
        self.set
            .as_ref()
            .is_some_and(|set| set.is_match(entry.to_slash_string()))
    }

    /// Removes excluded entries, keeping order.
    ///
    /// With no patterns the input is returned as-is, not copied.
    pub fn apply<'a>(&self, classpath: &'a [FileRef]) -> Cow<'a, [FileRef]> {
        if self.is_empty() {
            return Cow::Borrowed(classpath);
        }
        Cow::Owned(
            classpath
                .iter()
                .filter(|entry| !self.matches(entry))
                .cloned()
                .collect(),
        )
    }

    /// Returns the entries [`apply`](Self::apply) would remove, in order.
    pub fn excluded(&self, classpath: &[FileRef]) -> Vec<FileRef> {
        classpath
            .iter()
            .filter(|entry| self.matches(entry))
            .cloned()
            .collect()
    }
}
