//! The seam to the external checking engine.
//!
//! Parsing class files, reading signature files, and deciding whether a
//! reference is undefined all happen behind [`SignatureEngine`]. The rest of
//! the workspace only decides which files, signatures, and exclusions are
//! handed to it.

use std::path::PathBuf;

use sigcheck_common::FileRef;

use crate::reference::SignatureRef;
use crate::signature::SignatureSet;
use crate::violation::Violation;

/// Errors reported by a checking engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A signature or classpath entry could not be read.
    #[error("cannot read {path}: {reason}")]
    Unreadable {
        /// The file that failed.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The engine produced output that could not be interpreted.
    #[error("malformed engine output: {reason}")]
    MalformedOutput {
        /// Description of the problem.
        reason: String,
    },

    /// The engine failed for any other reason.
    #[error("checking engine failed: {reason}")]
    Crashed {
        /// Description of the failure.
        reason: String,
    },
}

/// Inputs for one engine check pass.
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    /// Compilation unit name, for logging.
    pub unit: &'a str,
    /// Compiled project outputs to check (class directories or jars).
    pub classes: &'a [FileRef],
    /// Classpath scanned live for additional available symbols.
    pub classpath: &'a [FileRef],
    /// The signature to check against.
    pub signature: &'a SignatureSet,
}

/// An external bytecode-signature checking engine.
///
/// Implementations must be safe to share across threads: independent
/// compilation units are checked concurrently against the same engine.
pub trait SignatureEngine: Send + Sync {
    /// Reads a declared signature into memory.
    fn load_signature(&self, signature: &SignatureRef) -> Result<SignatureSet, EngineError>;

    /// Scans classpath entries and returns the symbols they define.
    ///
    /// Entries earlier in `entries` take precedence on conflicting class
    /// definitions.
    fn scan_classpath(&self, entries: &[FileRef]) -> Result<SignatureSet, EngineError>;

    /// Checks `request.classes` and returns undefined references in the
    /// order they were encountered.
    fn check(&self, request: &CheckRequest<'_>) -> Result<Vec<Violation>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_display() {
        let err = EngineError::Unreadable {
            path: PathBuf::from("/sigs/java18.signature"),
            reason: "no such file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("java18.signature"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn malformed_display() {
        let err = EngineError::MalformedOutput {
            reason: "truncated record".to_string(),
        };
        assert!(err.to_string().contains("truncated record"));
    }

    #[test]
    fn crashed_display() {
        let err = EngineError::Crashed {
            reason: "stack overflow".to_string(),
        };
        assert_eq!(err.to_string(), "checking engine failed: stack overflow");
    }
}
