//! Error types for a unit's check pipeline.

use std::path::PathBuf;

use sigcheck_cache::CacheError;
use sigcheck_config::ConfigError;
use sigcheck_signature::EngineError;

/// Errors that abort one compilation unit's pipeline.
///
/// None of these affect sibling units. Finding violations is not an error:
/// it is reported through [`CheckOutcome`](crate::CheckOutcome).
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The unit's configuration is invalid (e.g. a malformed exclude glob).
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// A declared signature could not be read.
    #[error("unit '{unit}': cannot resolve signature {signature}: {source}")]
    Resolution {
        /// The unit being checked.
        unit: String,
        /// The signature as declared.
        signature: String,
        /// The engine's failure.
        source: EngineError,
    },

    /// The checking engine failed or produced unusable output.
    #[error("unit '{unit}': {source}")]
    Engine {
        /// The unit being checked.
        unit: String,
        /// The engine's failure.
        source: EngineError,
    },

    /// The cache artifact could not be persisted.
    #[error("unit '{unit}': {source}")]
    Cache {
        /// The unit being checked.
        unit: String,
        /// The cache failure.
        source: CacheError,
    },

    /// A report file could not be written.
    #[error("cannot write report {path}: {source}")]
    Report {
        /// The report path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl CheckError {
    /// Attributes a cache-build failure to `unit`, keeping resolution and
    /// engine failures distinct from persistence failures.
    pub fn from_cache(unit: &str, err: CacheError) -> Self {
        match err {
            CacheError::Resolution { signature, source } => CheckError::Resolution {
                unit: unit.to_string(),
                signature,
                source,
            },
            CacheError::Scan { source } => CheckError::Engine {
                unit: unit.to_string(),
                source,
            },
            other => CheckError::Cache {
                unit: unit.to_string(),
                source: other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreadable() -> EngineError {
        EngineError::Unreadable {
            path: PathBuf::from("java8.sig"),
            reason: "gone".to_string(),
        }
    }

    #[test]
    fn cache_resolution_maps_to_resolution() {
        let err = CheckError::from_cache(
            "main",
            CacheError::Resolution {
                signature: "java8".to_string(),
                source: unreadable(),
            },
        );
        assert!(matches!(err, CheckError::Resolution { ref unit, .. } if unit == "main"));
        assert!(err.to_string().contains("cannot resolve signature java8"));
    }

    #[test]
    fn cache_scan_maps_to_engine() {
        let err = CheckError::from_cache("main", CacheError::Scan { source: unreadable() });
        assert!(matches!(err, CheckError::Engine { .. }));
    }

    #[test]
    fn cache_io_stays_cache() {
        let err = CheckError::from_cache(
            "main",
            CacheError::Io {
                path: PathBuf::from("/cache/main.sigcache"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            },
        );
        assert!(matches!(err, CheckError::Cache { .. }));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn configuration_is_transparent() {
        let err: CheckError = ConfigError::InvalidPattern("'[x': unclosed".to_string()).into();
        assert_eq!(err.to_string(), "invalid pattern: '[x': unclosed");
    }
}
