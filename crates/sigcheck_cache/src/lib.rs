//! Consolidated signature caching.
//!
//! This crate merges declared signatures with a scan of the stable,
//! third-party part of a classpath into one artifact per compilation unit,
//! fingerprints the inputs it was built from, and reuses it across runs
//! while those inputs stay the same.

#![warn(missing_docs)]

pub mod artifact;
pub mod builder;
pub mod error;
pub mod fingerprint;

pub use artifact::{ArtifactHeader, ArtifactStore, CACHE_EXT};
pub use builder::{CacheArtifact, CacheRequest, CacheStatus, SignatureCacheBuilder, TOOL_VERSION};
pub use error::CacheError;
pub use fingerprint::{hash_file, CacheInputs};
