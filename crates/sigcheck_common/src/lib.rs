//! Shared foundational types used across the sigcheck crates.
//!
//! This crate provides canonical file references for classpath entries,
//! content hashing and input fingerprinting, and class name patterns.

#![warn(missing_docs)]

pub mod class_pattern;
pub mod file_ref;
pub mod hash;

pub use class_pattern::{any_matches, ClassPattern, ParseClassPatternError};
pub use file_ref::FileRef;
pub use hash::{ContentHash, Fingerprint};
