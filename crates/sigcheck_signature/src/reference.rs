//! References to declared signature sources.

use std::fmt;

use serde::{Deserialize, Serialize};
use sigcheck_common::FileRef;

/// A declared signature source: a resolved dependency coordinate artifact
/// or a locally built signature file.
///
/// Signatures are kept in declaration order everywhere; the first declared
/// signature takes precedence when definitions conflict.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureRef {
    /// Dependency coordinate (`group:name:version`) the file was resolved
    /// from, when it came from a repository.
    pub coordinate: Option<String>,
    /// The resolved signature file.
    pub file: FileRef,
}

impl SignatureRef {
    /// A signature built locally, with no coordinate.
    pub fn local(file: FileRef) -> Self {
        Self {
            coordinate: None,
            file,
        }
    }

    /// A signature resolved from a dependency coordinate.
    pub fn resolved(coordinate: impl Into<String>, file: FileRef) -> Self {
        Self {
            coordinate: Some(coordinate.into()),
            file,
        }
    }
}

impl fmt::Display for SignatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.coordinate {
            Some(coordinate) => write!(f, "{coordinate}"),
            None => write!(f, "{}", self.file),
        }
    }
}

impl fmt::Debug for SignatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureRef({self})")
    }
}
