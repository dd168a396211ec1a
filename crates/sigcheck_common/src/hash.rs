//! Content hashing for cache validation and input fingerprinting.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Used to checksum cache payloads and to fingerprint the inputs a cached
/// signature was built from. Two byte strings with the same `ContentHash`
/// are assumed to be identical.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Streaming hasher that folds an ordered sequence of fields into one
/// [`ContentHash`].
///
/// Every field is length-prefixed, so `["ab", "c"]` and `["a", "bc"]`
/// produce different fingerprints. Field order is significant.
pub struct Fingerprint {
    state: Xxh3,
}

impl Fingerprint {
    /// Starts a new fingerprint seeded with a domain tag.
    pub fn new(tag: &str) -> Self {
        let mut fp = Self { state: Xxh3::new() };
        fp.field(tag.as_bytes());
        fp
    }

    /// Appends one length-prefixed field.
    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.state.update(&(bytes.len() as u64).to_le_bytes());
        self.state.update(bytes);
        self
    }

    /// Appends a string field.
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.field(value.as_bytes())
    }

    /// Appends a previously computed hash as a field.
    pub fn hash(&mut self, hash: &ContentHash) -> &mut Self {
        self.field(&hash.0)
    }

    /// Appends a boolean flag.
    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.field(&[u8::from(value)])
    }

    /// Finishes the fingerprint.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"hello world");
        let b = ContentHash::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"hello");
        let b = ContentHash::from_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn display_format() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_abbreviated() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("ContentHash("));
        assert!(s.ends_with(')'));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn fingerprint_is_order_sensitive() {
        let a = Fingerprint::new("t").str("lib1.jar").str("lib2.jar").finish();
        let b = Fingerprint::new("t").str("lib2.jar").str("lib1.jar").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_fields_are_length_prefixed() {
        let a = Fingerprint::new("t").str("ab").str("c").finish();
        let b = Fingerprint::new("t").str("a").str("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_tag_separates_domains() {
        let a = Fingerprint::new("one").flag(true).finish();
        let b = Fingerprint::new("two").flag(true).finish();
        assert_ne!(a, b);
        assert_eq!(a, Fingerprint::new("one").flag(true).finish());
    }
}
