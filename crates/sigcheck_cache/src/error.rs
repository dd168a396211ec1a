//! Error types for cache operations.

use std::path::PathBuf;

use sigcheck_signature::EngineError;

/// Errors that can occur while building or persisting a cached signature.
///
/// Reads are fail-safe: a damaged or outdated artifact is a cache miss, not
/// an error. Builds are all-or-nothing: any error here means no artifact was
/// written and any previous artifact is untouched.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A declared signature could not be loaded.
    #[error("cannot resolve signature {signature}: {source}")]
    Resolution {
        /// The signature as declared (coordinate or path).
        signature: String,
        /// The engine's failure.
        source: EngineError,
    },

    /// The classpath scan failed.
    #[error("classpath scan failed: {source}")]
    Scan {
        /// The engine's failure.
        source: EngineError,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/main.sigcache"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("main.sigcache"));
    }

    #[test]
    fn resolution_display() {
        let err = CacheError::Resolution {
            signature: "org.example:java8:1.0".to_string(),
            source: EngineError::Unreadable {
                path: PathBuf::from("java8.sig"),
                reason: "not found".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("cannot resolve signature org.example:java8:1.0"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn scan_display() {
        let err = CacheError::Scan {
            source: EngineError::Crashed {
                reason: "zip bomb".to_string(),
            },
        };
        assert!(err.to_string().contains("zip bomb"));
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "invalid bincode data".to_string(),
        };
        assert!(err.to_string().contains("invalid bincode data"));
    }
}
