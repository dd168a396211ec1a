//! Violation suppression by ignored classes and by annotation marker.

use sigcheck_common::{any_matches, ClassPattern};
use sigcheck_signature::Violation;

/// Filters that remove violations the user has opted out of.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    ignore_classes: Vec<ClassPattern>,
    annotation: Option<String>,
}

impl Suppressions {
    /// Creates a filter from ignored class patterns and an optional
    /// suppression annotation.
    pub fn new(ignore_classes: Vec<ClassPattern>, annotation: Option<String>) -> Self {
        Self {
            ignore_classes,
            annotation,
        }
    }

    /// Returns `true` if `violation` should not be reported.
    pub fn suppresses(&self, violation: &Violation) -> bool {
        any_matches(&self.ignore_classes, &violation.referenced_class)
            || self
                .annotation
                .as_deref()
                .is_some_and(|a| violation.is_annotated_with(a))
    }

    /// Drops suppressed violations, keeping the order of the rest.
    /// Returns the number dropped.
    pub fn apply(&self, violations: &mut Vec<Violation>) -> usize {
        let before = violations.len();
        violations.retain(|v| !self.suppresses(v));
        before - violations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(line: u32, target: &str, annotations: &[&str]) -> Violation {
        Violation {
            class_name: "com.example.App".to_string(),
            line: Some(line),
            referenced_class: target.to_string(),
            description: format!("{target}.m()V"),
            annotations: annotations.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn ignore_classes_drop_matches() {
        let s = Suppressions::new(vec!["sun.misc.*".parse().unwrap()], None);
        let mut vs = vec![
            violation(1, "sun.misc.Unsafe", &[]),
            violation(2, "java.util.Optional", &[]),
            violation(3, "sun.misc.inner.Cleaner", &[]),
        ];
        assert_eq!(s.apply(&mut vs), 2);
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].line, Some(2));
    }

    #[test]
    fn annotation_drops_marked_scopes() {
        let s = Suppressions::new(Vec::new(), Some("org.example.IgnoreJRERequirement".into()));
        let mut vs = vec![
            violation(1, "java.util.Optional", &["org/example/IgnoreJRERequirement"]),
            violation(2, "java.util.Optional", &["org.example.Other"]),
            violation(3, "java.util.Optional", &[]),
        ];
        assert_eq!(s.apply(&mut vs), 1);
        let lines: Vec<_> = vs.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![Some(2), Some(3)]);
    }

    #[test]
    fn default_suppresses_nothing() {
        let s = Suppressions::default();
        let mut vs = vec![violation(1, "x.Y", &["any.Annotation"])];
        assert_eq!(s.apply(&mut vs), 0);
        assert_eq!(vs.len(), 1);
    }
}
