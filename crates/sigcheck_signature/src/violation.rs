//! Undefined-reference findings reported by a checking engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reference from project bytecode to a symbol absent from the effective
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// Binary name of the class containing the reference.
    pub class_name: String,
    /// Source line of the reference, when debug info is available.
    pub line: Option<u32>,
    /// Binary name of the class owning the referenced symbol.
    pub referenced_class: String,
    /// Human-readable description of the missing symbol.
    pub description: String,
    /// Annotations present on the enclosing member or class, used for
    /// suppression.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl Violation {
    /// Returns `true` if the enclosing scope carries `annotation`.
    ///
    /// Accepts either the binary or internal form of the annotation name.
    pub fn is_annotated_with(&self, annotation: &str) -> bool {
        let wanted = annotation.replace('/', ".");
        self.annotations
            .iter()
            .any(|a| a.replace('/', ".") == wanted)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.class_name)?,
            None => write!(f, "{}", self.class_name)?,
        }
        write!(f, "  Undefined reference: {}", self.description)
    }
}
