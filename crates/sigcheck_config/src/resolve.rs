//! Unit resolution: merging shared settings with per-unit overrides into the
//! immutable inputs of one check.

use crate::error::ConfigError;
use crate::types::{ProjectConfig, ReportFormat, SignatureDecl};
use globset::{Glob, GlobBuilder};
use sigcheck_common::{ClassPattern, FileRef};
use sigcheck_signature::SignatureRef;
use std::path::{Path, PathBuf};

/// Everything one compilation unit's check needs, fully resolved.
///
/// Built once after all user configuration is final and passed by value
/// into the orchestrator. Paths are canonical [`FileRef`]s.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Compilation unit name.
    pub unit: String,
    /// Compiled outputs to check.
    pub classes: Vec<FileRef>,
    /// Full compile classpath, in resolver order.
    pub classpath: Vec<FileRef>,
    /// Declared signatures, in declaration order.
    pub signatures: Vec<SignatureRef>,
    /// Glob patterns for classpath entries removed before scanning.
    pub exclude_jars: Vec<String>,
    /// Classes whose references are never reported.
    pub ignore_classes: Vec<ClassPattern>,
    /// Annotation that suppresses violations in the annotated scope.
    pub annotation: Option<String>,
    /// Report violations without failing.
    pub ignore_failures: bool,
    /// Cache settings; `None` when caching is disabled for this unit.
    pub cache: Option<CacheConfig>,
}

/// Settings for building and reusing the unit's cached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding one cache artifact per unit.
    pub cache_dir: PathBuf,
    /// Merge all signatures into one, or keep one cached signature per
    /// declared signature.
    pub merge_signatures: bool,
    /// Class patterns removed from the external classpath scan.
    pub exclude_classes: Vec<ClassPattern>,
}

/// Where and how per-unit reports are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Root directory for report files.
    pub reports_dir: PathBuf,
    /// Report format.
    pub format: ReportFormat,
}

/// A module of the build with its resolved primary artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildModule {
    /// Module name.
    pub name: String,
    /// Artifacts of the primary configuration; `None` when the module has
    /// no such configuration.
    pub artifacts: Option<Vec<FileRef>>,
}

/// Resolves a named unit by merging `[check]` settings with its overrides.
///
/// Each override replaces the shared value entirely; lists are not
/// concatenated. Relative paths resolve against `project_dir`.
pub fn resolve_unit(
    config: &ProjectConfig,
    project_dir: &Path,
    unit_name: &str,
) -> Result<CheckConfig, ConfigError> {
    let unit = config
        .units
        .get(unit_name)
        .ok_or_else(|| ConfigError::UnknownUnit(unit_name.to_string()))?;
    let check = &config.check;

    let signatures = unit
        .signatures
        .as_deref()
        .unwrap_or(&check.signatures)
        .iter()
        .map(|decl| resolve_signature(project_dir, decl))
        .collect();

    let exclude_jars = unit
        .exclude_jars
        .clone()
        .unwrap_or_else(|| check.exclude_jars.clone());
    validate_globs(&exclude_jars)?;

    let ignore_classes =
        parse_class_patterns(unit.ignore_classes.as_deref().unwrap_or(&check.ignore_classes))?;

    let cache = if unit.use_cache.unwrap_or(check.use_cache) {
        let exclude_classes = parse_class_patterns(
            unit.exclude_classes
                .as_deref()
                .unwrap_or(&check.exclude_classes),
        )?;
        Some(CacheConfig {
            cache_dir: project_dir.join(&check.cache_dir),
            merge_signatures: unit.merge_signatures.unwrap_or(check.merge_signatures),
            exclude_classes,
        })
    } else {
        None
    };

    Ok(CheckConfig {
        unit: unit_name.to_string(),
        classes: resolve_paths(project_dir, &unit.classes),
        classpath: resolve_paths(project_dir, &unit.classpath),
        signatures,
        exclude_jars,
        ignore_classes,
        annotation: check.annotation.clone(),
        ignore_failures: unit.ignore_failures.unwrap_or(check.ignore_failures),
        cache,
    })
}

/// Resolves every declared unit, in name order.
pub fn resolve_units(
    config: &ProjectConfig,
    project_dir: &Path,
) -> Result<Vec<CheckConfig>, ConfigError> {
    config
        .units
        .keys()
        .map(|name| resolve_unit(config, project_dir, name))
        .collect()
}

/// Resolves the declared modules and their artifacts.
pub fn resolve_modules(config: &ProjectConfig, project_dir: &Path) -> Vec<BuildModule> {
    config
        .modules
        .iter()
        .map(|module| BuildModule {
            name: module.name.clone(),
            artifacts: module
                .artifacts
                .as_ref()
                .map(|paths| resolve_paths(project_dir, paths)),
        })
        .collect()
}

/// Resolves the report location and format.
pub fn resolve_reports(config: &ProjectConfig, project_dir: &Path) -> ReportConfig {
    ReportConfig {
        reports_dir: project_dir.join(&config.check.reports_dir),
        format: config.check.report_format,
    }
}

/// Parses class patterns, failing on the first malformed one.
pub fn parse_class_patterns(patterns: &[String]) -> Result<Vec<ClassPattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            p.parse::<ClassPattern>()
                .map_err(|e| ConfigError::InvalidPattern(e.to_string()))
        })
        .collect()
}

/// Compiles one exclude glob.
///
/// `*` and `?` never match a path separator; only `**` crosses directories.
/// Backslashes are treated as separators.
pub fn compile_glob(pattern: &str) -> Result<Glob, ConfigError> {
    GlobBuilder::new(&pattern.replace('\\', "/"))
        .literal_separator(true)
        .build()
        .map_err(|e| ConfigError::InvalidPattern(format!("'{pattern}': {e}")))
}

/// Checks that every exclude glob compiles.
pub fn validate_globs(globs: &[String]) -> Result<(), ConfigError> {
    for glob in globs {
        compile_glob(glob)?;
    }
    Ok(())
}

fn resolve_paths(project_dir: &Path, paths: &[String]) -> Vec<FileRef> {
    paths
        .iter()
        .map(|p| FileRef::resolve(project_dir, p))
        .collect()
}

fn resolve_signature(project_dir: &Path, decl: &SignatureDecl) -> SignatureRef {
    let file = FileRef::resolve(project_dir, decl.path());
    match decl.coordinate() {
        Some(coordinate) => SignatureRef::resolved(coordinate, file),
        None => SignatureRef::local(file),
    }
}
