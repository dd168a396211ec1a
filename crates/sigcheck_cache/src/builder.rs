//! Building and reusing the consolidated signature for a compilation unit.
//!
//! The expensive part of a check is scanning every third-party jar's symbol
//! table. [`SignatureCacheBuilder`] does that scan once, folds it together
//! with the declared signatures, and persists the result so later runs with
//! identical inputs can skip it entirely.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sigcheck_common::{ClassPattern, ContentHash, FileRef};
use sigcheck_signature::{SignatureEngine, SignatureRef, SignatureSet};
use tracing::{debug, info};

use crate::artifact::ArtifactStore;
use crate::error::CacheError;
use crate::fingerprint::CacheInputs;

/// Tool version recorded in artifact headers and fingerprints.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Inputs for building one unit's cached signature.
#[derive(Debug, Clone, Copy)]
pub struct CacheRequest<'a> {
    /// Compilation unit name; also the artifact's file stem.
    pub unit: &'a str,
    /// Declared signatures, in declaration order.
    pub signatures: &'a [SignatureRef],
    /// External classpath subset (already exclude-filtered).
    pub external_classpath: &'a [FileRef],
    /// Class patterns removed from the classpath scan.
    pub exclude_classes: &'a [ClassPattern],
    /// Merge every signature into one, or keep one per declared signature.
    pub merge_signatures: bool,
}

impl<'a> CacheRequest<'a> {
    /// Compares the artifact in `store` against these inputs without
    /// loading any signature.
    pub fn status(&self, store: &ArtifactStore) -> CacheStatus {
        let inputs = self.inputs().fingerprint(TOOL_VERSION);
        match store.read_header(self.unit) {
            None => CacheStatus::Missing,
            Some(header) if header.inputs == inputs => CacheStatus::Fresh,
            Some(_) => CacheStatus::Stale,
        }
    }

    fn inputs(&self) -> CacheInputs<'a> {
        CacheInputs {
            signatures: self.signatures,
            external_classpath: self.external_classpath,
            exclude_classes: self.exclude_classes,
            merge_signatures: self.merge_signatures,
        }
    }
}

/// Serialized payload of a cache artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachePayload {
    merged: bool,
    signatures: Vec<SignatureSet>,
}

/// A consolidated signature, built for one unit and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheArtifact {
    /// Compilation unit the artifact belongs to.
    pub unit: String,
    /// Location on disk.
    pub path: PathBuf,
    /// Fingerprint of the inputs it was built from.
    pub inputs: ContentHash,
    /// `true` when all declared signatures were merged into one.
    pub merged: bool,
    /// The consolidated signatures: exactly one when merged, otherwise one
    /// per declared signature in declaration order. Each includes the
    /// external classpath scan.
    pub signatures: Vec<SignatureSet>,
}

/// Whether a unit's artifact on disk matches its current inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// An artifact exists and was built from the current inputs.
    Fresh,
    /// An artifact exists but was built from different inputs.
    Stale,
    /// No readable artifact exists.
    Missing,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStatus::Fresh => write!(f, "fresh"),
            CacheStatus::Stale => write!(f, "stale"),
            CacheStatus::Missing => write!(f, "missing"),
        }
    }
}

/// Builds, persists, and reuses per-unit cache artifacts.
pub struct SignatureCacheBuilder<'e> {
    engine: &'e dyn SignatureEngine,
    store: ArtifactStore,
}

impl<'e> SignatureCacheBuilder<'e> {
    /// Creates a builder writing artifacts under `store`.
    pub fn new(engine: &'e dyn SignatureEngine, store: ArtifactStore) -> Self {
        Self { engine, store }
    }

    /// Returns the underlying artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Compares the artifact on disk against the request's inputs without
    /// building anything.
    pub fn status(&self, request: &CacheRequest<'_>) -> CacheStatus {
        request.status(&self.store)
    }

    /// Returns the unit's artifact, reusing the one on disk when it was
    /// built from identical inputs and rebuilding it otherwise.
    ///
    /// Returns `Ok(None)` without touching the disk when no signatures are
    /// declared: there is nothing to check.
    pub fn build_or_reuse(
        &self,
        request: &CacheRequest<'_>,
    ) -> Result<Option<CacheArtifact>, CacheError> {
        if request.signatures.is_empty() {
            return Ok(None);
        }
        let inputs = request.inputs().fingerprint(TOOL_VERSION);

        if let Some(artifact) = self.load(request.unit, inputs) {
            info!(unit = %request.unit, inputs = %inputs, "reusing cached signature");
            return Ok(Some(artifact));
        }

        self.build_with(request, inputs).map(Some)
    }

    /// Rebuilds the unit's artifact unconditionally.
    ///
    /// Returns `Ok(None)` when no signatures are declared.
    pub fn build(&self, request: &CacheRequest<'_>) -> Result<Option<CacheArtifact>, CacheError> {
        if request.signatures.is_empty() {
            return Ok(None);
        }
        let inputs = request.inputs().fingerprint(TOOL_VERSION);
        self.build_with(request, inputs).map(Some)
    }

    fn load(&self, unit: &str, inputs: ContentHash) -> Option<CacheArtifact> {
        let bytes = self.store.read_artifact(unit, &inputs)?;
        let payload: CachePayload =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .ok()?
                .0;
        Some(CacheArtifact {
            unit: unit.to_string(),
            path: self.store.artifact_path(unit),
            inputs,
            merged: payload.merged,
            signatures: payload.signatures,
        })
    }

    fn build_with(
        &self,
        request: &CacheRequest<'_>,
        inputs: ContentHash,
    ) -> Result<CacheArtifact, CacheError> {
        info!(
            unit = %request.unit,
            signatures = request.signatures.len(),
            external = request.external_classpath.len(),
            "building cached signature"
        );

        // Every signature must load before anything is written.
        let mut declared = Vec::with_capacity(request.signatures.len());
        for signature in request.signatures {
            let set = self
                .engine
                .load_signature(signature)
                .map_err(|source| CacheError::Resolution {
                    signature: signature.to_string(),
                    source,
                })?;
            debug!(unit = %request.unit, %signature, classes = set.len(), "loaded signature");
            declared.push(set);
        }

        let mut scanned = self
            .engine
            .scan_classpath(request.external_classpath)
            .map_err(|source| CacheError::Scan { source })?;
        let dropped = scanned.remove_matching(request.exclude_classes);
        debug!(
            unit = %request.unit,
            classes = scanned.len(),
            excluded = dropped,
            "scanned external classpath"
        );

        let signatures = if request.merge_signatures {
            let mut merged = SignatureSet::merged(&declared);
            merged.merge_from(&scanned);
            vec![merged]
        } else {
            declared
                .into_iter()
                .map(|mut set| {
                    set.merge_from(&scanned);
                    set
                })
                .collect()
        };

        let payload = CachePayload {
            merged: request.merge_signatures,
            signatures,
        };
        let bytes = bincode::serde::encode_to_vec(&payload, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        let path = self
            .store
            .write_artifact(request.unit, inputs, &bytes, TOOL_VERSION)?;

        Ok(CacheArtifact {
            unit: request.unit.to_string(),
            path,
            inputs,
            merged: payload.merged,
            signatures: payload.signatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigcheck_signature::{ClassSignature, MemoryEngine};

    struct Fixture {
        dir: tempfile::TempDir,
        engine: MemoryEngine,
        s1: SignatureRef,
        s2: SignatureRef,
        lib1: FileRef,
        lib2: FileRef,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| {
            let p = dir.path().join(name);
            std::fs::write(&p, name.as_bytes()).unwrap();
            FileRef::new(p)
        };
        let s1 = path("s1.sig");
        let s2 = path("s2.sig");
        let lib1 = path("lib1.jar");
        let lib2 = path("lib2.jar");

        let engine = MemoryEngine::new()
            .with_signature(
                s1.clone(),
                SignatureSet::new().with_class(
                    "Foo",
                    ClassSignature::with_members(["bar()V"]).extends("Base1"),
                ),
            )
            .with_signature(
                s2.clone(),
                SignatureSet::new()
                    .with_class("Foo", ClassSignature::default().extends("Base2"))
                    .with_class("Qux", ClassSignature::with_members(["q()V"])),
            )
            .with_entry(
                lib1.clone(),
                SignatureSet::new()
                    .with_class("lib1.Api", ClassSignature::with_members(["a()V"]))
                    .with_class("lib1.internal.Impl", ClassSignature::default()),
            )
            .with_entry(
                lib2.clone(),
                SignatureSet::new().with_class("lib2.Api", ClassSignature::default()),
            );

        Fixture {
            dir,
            engine,
            s1: SignatureRef::local(s1),
            s2: SignatureRef::local(s2),
            lib1,
            lib2,
        }
    }

    fn builder(f: &Fixture) -> SignatureCacheBuilder<'_> {
        SignatureCacheBuilder::new(&f.engine, ArtifactStore::new(&f.dir.path().join("cache")))
    }

    fn request<'a>(
        sigs: &'a [SignatureRef],
        cp: &'a [FileRef],
        excludes: &'a [ClassPattern],
        merge: bool,
    ) -> CacheRequest<'a> {
        CacheRequest {
            unit: "main",
            signatures: sigs,
            external_classpath: cp,
            exclude_classes: excludes,
            merge_signatures: merge,
        }
    }

    #[test]
    fn no_signatures_builds_nothing() {
        let f = fixture();
        let b = builder(&f);
        let cp = [f.lib1.clone()];
        assert!(b.build_or_reuse(&request(&[], &cp, &[], true)).unwrap().is_none());
        assert_eq!(f.engine.scan_count(), 0);
        assert!(!b.store().artifact_path("main").exists());
    }

    #[test]
    fn merged_artifact_preserves_declaration_precedence() {
        let f = fixture();
        let b = builder(&f);
        let sigs = [f.s1.clone(), f.s2.clone()];
        let cp = [f.lib1.clone(), f.lib2.clone()];
        let artifact = b
            .build_or_reuse(&request(&sigs, &cp, &[], true))
            .unwrap()
            .unwrap();

        assert!(artifact.merged);
        assert_eq!(artifact.signatures.len(), 1);
        let merged = &artifact.signatures[0];
        assert_eq!(
            merged.class("Foo").unwrap().superclass.as_deref(),
            Some("Base1")
        );
        assert!(merged.resolves("Foo", "bar()V"));
        assert!(merged.contains_class("Qux"));
        assert!(merged.contains_class("lib1.Api"));
        assert!(merged.contains_class("lib2.Api"));
    }

    #[test]
    fn unmerged_artifact_reuses_one_scan() {
        let f = fixture();
        let b = builder(&f);
        let sigs = [f.s1.clone(), f.s2.clone()];
        let cp = [f.lib1.clone()];
        let artifact = b
            .build_or_reuse(&request(&sigs, &cp, &[], false))
            .unwrap()
            .unwrap();

        assert!(!artifact.merged);
        assert_eq!(artifact.signatures.len(), 2);
        assert_eq!(f.engine.scan_count(), 1);
        assert!(artifact.signatures[0].contains_class("lib1.Api"));
        assert!(artifact.signatures[1].contains_class("lib1.Api"));
        assert!(!artifact.signatures[0].contains_class("Qux"));
        assert!(artifact.signatures[1].contains_class("Qux"));
    }

    #[test]
    fn exclude_classes_trim_the_scan() {
        let f = fixture();
        let b = builder(&f);
        let sigs = [f.s1.clone()];
        let cp = [f.lib1.clone()];
        let excludes = ["lib1.internal.*".parse().unwrap()];
        let artifact = b
            .build_or_reuse(&request(&sigs, &cp, &excludes, true))
            .unwrap()
            .unwrap();
        assert!(artifact.signatures[0].contains_class("lib1.Api"));
        assert!(!artifact.signatures[0].contains_class("lib1.internal.Impl"));
    }

    #[test]
    fn identical_inputs_are_reused() {
        let f = fixture();
        let b = builder(&f);
        let sigs = [f.s1.clone()];
        let cp = [f.lib1.clone()];
        let req = request(&sigs, &cp, &[], true);

        assert_eq!(b.status(&req), CacheStatus::Missing);
        let first = b.build_or_reuse(&req).unwrap().unwrap();
        let bytes_first = std::fs::read(&first.path).unwrap();
        assert_eq!(b.status(&req), CacheStatus::Fresh);

        let second = b.build_or_reuse(&req).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(f.engine.scan_count(), 1, "second run must not rescan");

        let rebuilt = b.build(&req).unwrap().unwrap();
        assert_eq!(rebuilt, first);
        assert_eq!(std::fs::read(&rebuilt.path).unwrap(), bytes_first);
        assert_eq!(f.engine.scan_count(), 2);
    }

    #[test]
    fn class_directory_edits_invalidate() {
        let f = fixture();
        let b = builder(&f);
        let classes = f.dir.path().join("vendor-classes");
        std::fs::create_dir_all(&classes).unwrap();
        std::fs::write(classes.join("A.class"), b"a v1").unwrap();
        let sigs = [f.s1.clone()];
        let cp = [FileRef::new(&classes)];
        let req = request(&sigs, &cp, &[], true);

        b.build_or_reuse(&req).unwrap().unwrap();
        assert_eq!(b.status(&req), CacheStatus::Fresh);

        std::fs::write(classes.join("A.class"), b"a v2").unwrap();
        assert_eq!(b.status(&req), CacheStatus::Stale);
        b.build_or_reuse(&req).unwrap().unwrap();
        assert_eq!(f.engine.scan_count(), 2);

        std::fs::write(classes.join("B.class"), b"b").unwrap();
        assert_eq!(b.status(&req), CacheStatus::Stale);
    }

    #[test]
    fn changed_inputs_invalidate() {
        let f = fixture();
        let b = builder(&f);
        let sigs = [f.s1.clone()];
        let both = [f.lib1.clone(), f.lib2.clone()];
        let first = b
            .build_or_reuse(&request(&sigs, &both, &[], true))
            .unwrap()
            .unwrap();

        let filtered = [f.lib1.clone()];
        let req = request(&sigs, &filtered, &[], true);
        assert_eq!(b.status(&req), CacheStatus::Stale);
        let second = b.build_or_reuse(&req).unwrap().unwrap();
        assert_ne!(first.inputs, second.inputs);
        assert_ne!(first.signatures, second.signatures);
        assert_eq!(f.engine.scan_count(), 2);
    }

    #[test]
    fn unresolvable_signature_leaves_previous_artifact() {
        let f = fixture();
        let b = builder(&f);
        let good = [f.s1.clone()];
        let cp = [f.lib1.clone()];
        let previous = b
            .build_or_reuse(&request(&good, &cp, &[], true))
            .unwrap()
            .unwrap();
        let before = std::fs::read(&previous.path).unwrap();

        let missing = SignatureRef::resolved(
            "org.example:missing:1.0",
            FileRef::new(f.dir.path().join("missing.sig")),
        );
        let bad = [f.s1.clone(), missing];
        let err = b
            .build_or_reuse(&request(&bad, &cp, &[], true))
            .unwrap_err();
        assert!(matches!(err, CacheError::Resolution { ref signature, .. } if signature == "org.example:missing:1.0"));
        assert_eq!(std::fs::read(&previous.path).unwrap(), before);
    }

    #[test]
    fn corrupt_artifact_is_rebuilt() {
        let f = fixture();
        let b = builder(&f);
        let sigs = [f.s1.clone()];
        let cp = [f.lib1.clone()];
        let req = request(&sigs, &cp, &[], true);
        let first = b.build_or_reuse(&req).unwrap().unwrap();
        std::fs::write(&first.path, b"garbage").unwrap();

        assert_eq!(b.status(&req), CacheStatus::Missing);
        let second = b.build_or_reuse(&req).unwrap().unwrap();
        assert_eq!(first.signatures, second.signatures);
        assert_eq!(f.engine.scan_count(), 2);
    }
}
