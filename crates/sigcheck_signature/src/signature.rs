//! Symbol-availability model for API signatures.
//!
//! A [`SignatureSet`] lists the classes and members considered available on
//! a target platform. Sets built from several sources are combined with
//! [`SignatureSet::merge_from`], where the earlier-declared source wins on
//! conflicting class definitions.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use sigcheck_common::ClassPattern;

/// The declared shape of one class within a signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSignature {
    /// Binary name of the superclass, if any.
    pub superclass: Option<String>,
    /// Binary names of directly implemented interfaces.
    pub interfaces: Vec<String>,
    /// Member keys (`name` + descriptor, e.g. `isBlank()Z`).
    pub members: BTreeSet<String>,
}

impl ClassSignature {
    /// Creates a class signature with the given members and no supertypes.
    pub fn with_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            superclass: None,
            interfaces: Vec::new(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the superclass.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }
}

/// An ordered-deterministic set of available classes and members.
///
/// Backed by a `BTreeMap` so that serialization is byte-identical for
/// identical contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    classes: BTreeMap<String, ClassSignature>,
}

impl SignatureSet {
    /// Creates an empty signature set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a class. Replaces any existing definition.
    pub fn with_class(mut self, name: impl Into<String>, class: ClassSignature) -> Self {
        self.insert_class(name, class);
        self
    }

    /// Inserts or replaces a class definition.
    pub fn insert_class(&mut self, name: impl Into<String>, class: ClassSignature) {
        self.classes.insert(name.into(), class);
    }

    /// Returns the definition of `name`, if present.
    pub fn class(&self, name: &str) -> Option<&ClassSignature> {
        self.classes.get(name)
    }

    /// Returns `true` if the class is declared.
    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Iterates class names in sorted order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Number of declared classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no classes are declared.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns `true` if `member` is available on `class`, either directly or
    /// through its declared superclass and interface chain.
    pub fn resolves(&self, class: &str, member: &str) -> bool {
        let mut pending = vec![class];
        let mut seen = HashSet::new();
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            let Some(sig) = self.classes.get(name) else {
                continue;
            };
            if sig.members.contains(member) {
                return true;
            }
            pending.extend(sig.interfaces.iter().map(String::as_str));
            if let Some(superclass) = &sig.superclass {
                pending.push(superclass);
            }
        }
        false
    }

    /// Merges a later-declared set into this one.
    ///
    /// Classes only present in `later` are added. For classes present in
    /// both, this set's supertype declarations are kept and `later`'s members
    /// are unioned in; nothing already present is overwritten.
    pub fn merge_from(&mut self, later: &SignatureSet) {
        for (name, class) in &later.classes {
            match self.classes.get_mut(name) {
                Some(existing) => {
                    existing.members.extend(class.members.iter().cloned());
                }
                None => {
                    self.classes.insert(name.clone(), class.clone());
                }
            }
        }
    }

    /// Merges `sets` in declaration order, earliest taking precedence.
    pub fn merged<'a, I>(sets: I) -> SignatureSet
    where
        I: IntoIterator<Item = &'a SignatureSet>,
    {
        let mut out = SignatureSet::new();
        for set in sets {
            out.merge_from(set);
        }
        out
    }

    /// Removes every class matched by any of `patterns`, returning the number
    /// removed.
    pub fn remove_matching(&mut self, patterns: &[ClassPattern]) -> usize {
        if patterns.is_empty() {
            return 0;
        }
        let before = self.classes.len();
        self.classes
            .retain(|name, _| !patterns.iter().any(|p| p.matches(name)));
        before - self.classes.len()
    }
}
