//! Class and package name patterns used for ignore and exclude rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A pattern over fully qualified class names.
///
/// Accepted forms:
/// - `com.example.Foo` matches that class and its nested classes
///   (`com.example.Foo$Bar`).
/// - `com.example.*` matches every class in `com.example` and its
///   subpackages.
///
/// Internal (`com/example/Foo`) and binary (`com.example.Foo`) names are
/// both accepted, on either side of the match.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassPattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum PatternKind {
    Exact(String),
    Package(String),
}

/// Error returned when a class pattern is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid class pattern '{pattern}': {reason}")]
pub struct ParseClassPatternError {
    /// The rejected pattern text.
    pub pattern: String,
    /// Why the pattern was rejected.
    pub reason: &'static str,
}

impl ClassPattern {
    /// Returns `true` if `class_name` is matched by this pattern.
    pub fn matches(&self, class_name: &str) -> bool {
        let name = binary_name(class_name);
        match &self.kind {
            PatternKind::Exact(exact) => {
                name == *exact
                    || name
                        .strip_prefix(exact.as_str())
                        .is_some_and(|rest| rest.starts_with('$'))
            }
            PatternKind::Package(prefix) => {
                prefix.is_empty()
                    || name
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            }
        }
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Returns `true` if any pattern in `patterns` matches `class_name`.
pub fn any_matches(patterns: &[ClassPattern], class_name: &str) -> bool {
    patterns.iter().any(|p| p.matches(class_name))
}

fn binary_name(name: &str) -> String {
    name.trim().replace('/', ".")
}

impl FromStr for ClassPattern {
    type Err = ParseClassPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ParseClassPatternError {
            pattern: s.to_string(),
            reason,
        };
        let name = binary_name(s);
        if name.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let kind = if name == "*" {
            PatternKind::Package(String::new())
        } else if let Some(prefix) = name.strip_suffix(".*") {
            PatternKind::Package(prefix.to_string())
        } else {
            PatternKind::Exact(name.clone())
        };

        let body = match &kind {
            PatternKind::Exact(b) | PatternKind::Package(b) => b,
        };
        if body.contains('*') {
            return Err(invalid("wildcards are only supported as a trailing `.*`"));
        }
        if body.starts_with('.') || body.ends_with('.') || body.contains("..") {
            return Err(invalid("empty name segment"));
        }

        Ok(Self {
            raw: s.trim().to_string(),
            kind,
        })
    }
}

impl TryFrom<String> for ClassPattern {
    type Error = ParseClassPatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClassPattern> for String {
    fn from(pattern: ClassPattern) -> Self {
        pattern.raw
    }
}

impl fmt::Display for ClassPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for ClassPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassPattern({})", self.raw)
    }
}
