//! Configuration types deserialized from `sigcheck.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Default directory for per-unit report files, relative to the project.
pub const DEFAULT_REPORTS_DIR: &str = "build/reports/sigcheck";

/// Default directory for per-unit cache artifacts, relative to the project.
pub const DEFAULT_CACHE_DIR: &str = "build/sigcheck";

/// The top-level project configuration parsed from `sigcheck.toml`.
///
/// Contains the shared check settings, the modules of the multi-module
/// build, and the compilation units to check.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Settings shared by every unit unless overridden.
    #[serde(default)]
    pub check: CheckSettings,
    /// Modules participating in the build, with their primary artifacts.
    #[serde(default)]
    pub modules: Vec<ModuleDecl>,
    /// Compilation units keyed by name (e.g. "main", "test").
    #[serde(default)]
    pub units: BTreeMap<String, UnitDecl>,
}

/// Shared check settings from the `[check]` table.
#[derive(Debug, Deserialize)]
pub struct CheckSettings {
    /// Signatures to check against, in declaration order.
    #[serde(default)]
    pub signatures: Vec<SignatureDecl>,
    /// Whether to pre-merge signatures and external jars into a cache artifact.
    #[serde(default = "default_true")]
    pub use_cache: bool,
    /// Whether declared signatures are merged into one when caching.
    #[serde(default = "default_true")]
    pub merge_signatures: bool,
    /// Report violations without failing the build.
    #[serde(default)]
    pub ignore_failures: bool,
    /// Annotation marking code whose violations are suppressed.
    #[serde(default)]
    pub annotation: Option<String>,
    /// Classes whose references are never reported.
    #[serde(default)]
    pub ignore_classes: Vec<String>,
    /// Glob patterns for classpath entries removed before scanning.
    #[serde(default)]
    pub exclude_jars: Vec<String>,
    /// Class patterns removed from the cached classpath scan.
    #[serde(default)]
    pub exclude_classes: Vec<String>,
    /// Directory for report files.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,
    /// Report file format.
    #[serde(default)]
    pub report_format: ReportFormat,
    /// Directory for cache artifacts.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            signatures: Vec::new(),
            use_cache: true,
            merge_signatures: true,
            ignore_failures: false,
            annotation: None,
            ignore_classes: Vec::new(),
            exclude_jars: Vec::new(),
            exclude_classes: Vec::new(),
            reports_dir: default_reports_dir(),
            report_format: ReportFormat::default(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reports_dir() -> String {
    DEFAULT_REPORTS_DIR.to_string()
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

/// A declared signature source.
///
/// Accepts either a bare path string or a table with a path and the
/// dependency coordinate it was resolved from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignatureDecl {
    /// A path to a signature file.
    Path(String),
    /// A signature resolved from a dependency coordinate.
    Resolved {
        /// The resolved signature file.
        path: String,
        /// The `group:name:version` coordinate.
        coordinate: Option<String>,
    },
}

impl SignatureDecl {
    /// Returns the declared file path.
    pub fn path(&self) -> &str {
        match self {
            SignatureDecl::Path(path) | SignatureDecl::Resolved { path, .. } => path,
        }
    }

    /// Returns the declared coordinate, if any.
    pub fn coordinate(&self) -> Option<&str> {
        match self {
            SignatureDecl::Path(_) => None,
            SignatureDecl::Resolved { coordinate, .. } => coordinate.as_deref(),
        }
    }
}

/// A module of the multi-module build.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDecl {
    /// Module name.
    pub name: String,
    /// Artifacts published under the module's primary configuration.
    /// Absent for modules without one.
    #[serde(default)]
    pub artifacts: Option<Vec<String>>,
}

/// A compilation unit to check.
///
/// Every optional field overrides the matching `[check]` setting.
#[derive(Debug, Default, Deserialize)]
pub struct UnitDecl {
    /// Compiled outputs (class directories or jars) to check.
    #[serde(default)]
    pub classes: Vec<String>,
    /// The unit's resolved compile classpath, in resolver order.
    #[serde(default)]
    pub classpath: Vec<String>,
    /// Signature override.
    pub signatures: Option<Vec<SignatureDecl>>,
    /// Ignore-class override.
    pub ignore_classes: Option<Vec<String>>,
    /// Exclude-jar override.
    pub exclude_jars: Option<Vec<String>>,
    /// Exclude-class override.
    pub exclude_classes: Option<Vec<String>>,
    /// Cache toggle override.
    pub use_cache: Option<bool>,
    /// Merge toggle override.
    pub merge_signatures: Option<bool>,
    /// Failure toggle override.
    pub ignore_failures: Option<bool>,
}

/// Output format for per-unit report files.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One `Class:line  Undefined reference: ...` line per violation.
    #[default]
    Text,
    /// A JSON array of violations.
    Json,
}

impl ReportFormat {
    /// File extension used for reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}
