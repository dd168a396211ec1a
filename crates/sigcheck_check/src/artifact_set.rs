//! The set of artifacts produced by modules of the current build.
//!
//! Classpath entries that belong to this set are local build products and
//! change between runs; everything else is a stable third-party dependency.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;
use sigcheck_common::FileRef;
use sigcheck_config::BuildModule;
use tracing::debug;

/// Immutable set of module-produced artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    entries: BTreeSet<FileRef>,
}

impl ArtifactSet {
    /// Creates a set from explicit artifacts.
    pub fn from_artifacts<I: IntoIterator<Item = FileRef>>(artifacts: I) -> Self {
        Self {
            entries: artifacts.into_iter().collect(),
        }
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of artifacts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates artifacts in path order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRef> {
        self.entries.iter()
    }

    /// Returns `true` if `entry` is one of the artifacts or lies inside an
    /// artifact directory.
    pub fn covers(&self, entry: &FileRef) -> bool {
        self.entries.contains(entry) || self.entries.iter().any(|a| entry.is_within(a))
    }
}

/// Unions the primary artifacts of every module.
///
/// Modules without a primary configuration contribute nothing.
pub fn collect_module_artifacts(modules: &[BuildModule]) -> ArtifactSet {
    ArtifactSet::from_artifacts(
        modules
            .iter()
            .filter_map(|m| m.artifacts.as_ref())
            .flatten()
            .cloned(),
    )
}

/// Build-wide holder computing the [`ArtifactSet`] at most once.
///
/// Concurrent first callers block until the single computation finishes and
/// then share its result.
#[derive(Debug)]
pub struct ModuleArtifacts {
    modules: Vec<BuildModule>,
    set: OnceCell<ArtifactSet>,
    computations: AtomicUsize,
}

impl ModuleArtifacts {
    /// Creates a holder for the given modules. Nothing is computed yet.
    pub fn new(modules: Vec<BuildModule>) -> Self {
        Self {
            modules,
            set: OnceCell::new(),
            computations: AtomicUsize::new(0),
        }
    }

    /// Returns the artifact set, computing it on first access.
    pub fn get(&self) -> &ArtifactSet {
        self.set.get_or_init(|| {
            self.computations.fetch_add(1, Ordering::Relaxed);
            let set = collect_module_artifacts(&self.modules);
            debug!(
                modules = self.modules.len(),
                artifacts = set.len(),
                "collected module artifacts"
            );
            set
        })
    }

    /// How many times the set has been computed (0 or 1).
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn f(name: &str) -> FileRef {
        FileRef::new(format!("/nonexistent/{name}"))
    }

    fn modules() -> Vec<BuildModule> {
        vec![
            BuildModule {
                name: "core".to_string(),
                artifacts: Some(vec![f("core/build/libs/core.jar")]),
            },
            BuildModule {
                name: "bom".to_string(),
                artifacts: None,
            },
            BuildModule {
                name: "web".to_string(),
                artifacts: Some(vec![f("web/build/libs/web.jar"), f("web/build/classes")]),
            },
        ]
    }

    #[test]
    fn union_across_modules() {
        let set = collect_module_artifacts(&modules());
        assert_eq!(set.len(), 3);
        assert!(set.covers(&f("core/build/libs/core.jar")));
        assert!(set.covers(&f("web/build/libs/web.jar")));
        assert!(!set.covers(&f("libs/guava.jar")));
    }

    #[test]
    fn covers_entries_inside_artifact_directories() {
        let set = collect_module_artifacts(&modules());
        assert!(set.covers(&f("web/build/classes/java/main")));
        assert!(!set.covers(&f("web/build/classes2")));
    }

    #[test]
    fn no_modules_gives_empty_set() {
        assert!(collect_module_artifacts(&[]).is_empty());
    }

    #[test]
    fn memoized_once() {
        let holder = ModuleArtifacts::new(modules());
        assert_eq!(holder.computations(), 0);
        let first = holder.get().clone();
        let second = holder.get();
        assert_eq!(&first, second);
        assert_eq!(holder.computations(), 1);
    }

    #[test]
    fn concurrent_first_access_computes_once() {
        let holder = Arc::new(ModuleArtifacts::new(modules()));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let holder = Arc::clone(&holder);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    holder.get().len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 3);
        }
        assert_eq!(holder.computations(), 1);
    }
}
