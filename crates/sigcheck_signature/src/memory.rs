//! An in-memory [`SignatureEngine`].
//!
//! Hosts that already hold parsed symbol tables (or tests) register
//! signatures, classpath contents, and per-output references up front. The
//! engine then answers loads, scans, and checks from those tables.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use sigcheck_common::FileRef;

use crate::engine::{CheckRequest, EngineError, SignatureEngine};
use crate::reference::SignatureRef;
use crate::signature::SignatureSet;
use crate::violation::Violation;

/// A symbol reference made from project bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Class containing the reference.
    pub class_name: String,
    /// Line of the reference.
    pub line: Option<u32>,
    /// Class owning the referenced symbol.
    pub target_class: String,
    /// Referenced member key, or `None` for a reference to the class itself.
    pub member: Option<String>,
    /// Annotations on the enclosing scope.
    pub annotations: Vec<String>,
}

impl Reference {
    /// A member reference from `class_name` at `line`.
    pub fn member(
        class_name: impl Into<String>,
        line: u32,
        target_class: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            line: Some(line),
            target_class: target_class.into(),
            member: Some(member.into()),
            annotations: Vec::new(),
        }
    }

    /// A reference to a class as a whole.
    pub fn class(
        class_name: impl Into<String>,
        line: u32,
        target_class: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            line: Some(line),
            target_class: target_class.into(),
            member: None,
            annotations: Vec::new(),
        }
    }

    /// Marks the enclosing scope with an annotation.
    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    fn description(&self) -> String {
        match &self.member {
            Some(member) => format!("{}.{member}", self.target_class),
            None => self.target_class.clone(),
        }
    }
}

/// Engine answering from pre-registered tables.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    signatures: HashMap<FileRef, SignatureSet>,
    entries: HashMap<FileRef, SignatureSet>,
    outputs: HashMap<FileRef, (SignatureSet, Vec<Reference>)>,
    scans: AtomicUsize,
    checks: AtomicUsize,
}

impl MemoryEngine {
    /// Creates an engine with no registered tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the contents of a signature file.
    pub fn with_signature(mut self, file: FileRef, set: SignatureSet) -> Self {
        self.signatures.insert(file, set);
        self
    }

    /// Registers the classes defined by a classpath entry.
    pub fn with_entry(mut self, file: FileRef, defines: SignatureSet) -> Self {
        self.entries.insert(file, defines);
        self
    }

    /// Registers a compiled project output: the classes it defines and the
    /// references it makes, in encounter order.
    pub fn with_output(
        mut self,
        file: FileRef,
        defines: SignatureSet,
        references: Vec<Reference>,
    ) -> Self {
        self.outputs.insert(file, (defines, references));
        self
    }

    /// Number of [`SignatureEngine::scan_classpath`] calls so far.
    ///
    /// The classpath resolved inside [`SignatureEngine::check`] is not
    /// counted, so this measures only scans done to build signatures.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    /// Number of [`SignatureEngine::check`] passes so far.
    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::Relaxed)
    }

    fn defined_by(&self, entries: &[FileRef]) -> SignatureSet {
        let mut out = SignatureSet::new();
        for entry in entries {
            // Unknown entries define nothing, like an empty jar.
            if let Some(defines) = self.entries.get(entry) {
                out.merge_from(defines);
            }
        }
        out
    }
}

impl SignatureEngine for MemoryEngine {
    fn load_signature(&self, signature: &SignatureRef) -> Result<SignatureSet, EngineError> {
        self.signatures
            .get(&signature.file)
            .cloned()
            .ok_or_else(|| EngineError::Unreadable {
                path: signature.file.path().to_path_buf(),
                reason: "signature not registered".to_string(),
            })
    }

    fn scan_classpath(&self, entries: &[FileRef]) -> Result<SignatureSet, EngineError> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        Ok(self.defined_by(entries))
    }

    fn check(&self, request: &CheckRequest<'_>) -> Result<Vec<Violation>, EngineError> {
        self.checks.fetch_add(1, Ordering::Relaxed);

        let mut available = request.signature.clone();
        for output in request.classes {
            if let Some((defines, _)) = self.outputs.get(output) {
                available.merge_from(defines);
            }
        }
        available.merge_from(&self.defined_by(request.classpath));

        let mut violations = Vec::new();
        for output in request.classes {
            let (_, references) =
                self.outputs
                    .get(output)
                    .ok_or_else(|| EngineError::Unreadable {
                        path: output.path().to_path_buf(),
                        reason: "output not registered".to_string(),
                    })?;
            for reference in references {
                let defined = match &reference.member {
                    Some(member) => available.resolves(&reference.target_class, member),
                    None => available.contains_class(&reference.target_class),
                };
                if !defined {
                    violations.push(Violation {
                        class_name: reference.class_name.clone(),
                        line: reference.line,
                        referenced_class: reference.target_class.clone(),
                        description: reference.description(),
                        annotations: reference.annotations.clone(),
                    });
                }
            }
        }
        Ok(violations)
    }
}
