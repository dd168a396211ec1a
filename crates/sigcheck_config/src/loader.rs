//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::resolve::{parse_class_patterns, validate_globs};
use crate::types::{ProjectConfig, UnitDecl};
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "sigcheck.toml";

/// Loads and validates a `sigcheck.toml` configuration from a project directory.
///
/// Reads `<project_dir>/sigcheck.toml`, parses it, and validates every name
/// and pattern before any classpath is touched.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path, whatever
/// its name.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `sigcheck.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates names and patterns.
///
/// Unit names become file names for reports and cache artifacts, so they
/// must be plain path components.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    for (index, module) in config.modules.iter().enumerate() {
        if module.name.is_empty() {
            return Err(ConfigError::MissingField(format!("modules[{index}].name")));
        }
    }

    let check = &config.check;
    validate_globs(&check.exclude_jars)?;
    parse_class_patterns(&check.ignore_classes)?;
    parse_class_patterns(&check.exclude_classes)?;
    if check.annotation.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::ValidationError(
            "check.annotation must not be empty".to_string(),
        ));
    }
    for decl in &check.signatures {
        if decl.path().is_empty() {
            return Err(ConfigError::MissingField("check.signatures.path".to_string()));
        }
    }

    for (name, unit) in &config.units {
        validate_unit(name, unit)?;
    }
    Ok(())
}

fn validate_unit(name: &str, unit: &UnitDecl) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::ValidationError(format!(
            "unit name '{name}' must be a plain file name"
        )));
    }
    if let Some(globs) = &unit.exclude_jars {
        validate_globs(globs)?;
    }
    if let Some(patterns) = &unit.ignore_classes {
        parse_class_patterns(patterns)?;
    }
    if let Some(patterns) = &unit.exclude_classes {
        parse_class_patterns(patterns)?;
    }
    if let Some(signatures) = &unit.signatures {
        if signatures.iter().any(|s| s.path().is_empty()) {
            return Err(ConfigError::MissingField(format!(
                "units.{name}.signatures.path"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReportFormat, SignatureDecl};

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str("").unwrap();
        assert!(config.units.is_empty());
        assert!(config.modules.is_empty());
        assert!(config.check.signatures.is_empty());
        assert!(config.check.use_cache);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[check]
signatures = [
    "sigs/local.sig",
    { path = "sigs/java18.sig", coordinate = "org.codehaus.mojo.signature:java18:1.0" },
]
use_cache = false
merge_signatures = false
ignore_failures = true
annotation = "org.codehaus.mojo.animal_sniffer.IgnoreJRERequirement"
ignore_classes = ["sun.misc.*"]
exclude_jars = ["**/lombok-*.jar"]
exclude_classes = ["com.example.internal.*"]
reports_dir = "out/reports"
report_format = "json"
cache_dir = "out/cache"

[[modules]]
name = "core"
artifacts = ["core/build/libs/core.jar"]

[[modules]]
name = "bom"

[units.main]
classes = ["build/classes/java/main"]
classpath = ["core/build/libs/core.jar", "libs/guava.jar"]

[units.test]
classes = ["build/classes/java/test"]
use_cache = true
ignore_classes = ["org.junit.*"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.check.signatures.len(), 2);
        assert!(matches!(config.check.signatures[0], SignatureDecl::Path(_)));
        assert_eq!(
            config.check.signatures[1].coordinate(),
            Some("org.codehaus.mojo.signature:java18:1.0")
        );
        assert!(!config.check.use_cache);
        assert!(!config.check.merge_signatures);
        assert!(config.check.ignore_failures);
        assert_eq!(config.check.report_format, ReportFormat::Json);
        assert_eq!(config.modules.len(), 2);
        assert!(config.modules[1].artifacts.is_none());
        assert_eq!(config.units["main"].classpath.len(), 2);
        assert_eq!(config.units["test"].use_cache, Some(true));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn malformed_glob_errors() {
        let toml = r#"
[check]
exclude_jars = ["libs/[abc.jar"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern(_)));
    }

    #[test]
    fn malformed_class_pattern_errors() {
        let toml = r#"
[units.main]
ignore_classes = ["com.*.Foo"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern(_)));
    }

    #[test]
    fn unit_name_with_separator_errors() {
        let toml = r#"
[units."../escape"]
classes = ["x"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_module_name_errors() {
        let toml = r#"
[[modules]]
name = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn empty_annotation_errors() {
        let toml = r#"
[check]
annotation = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[units.main]\nclasses = [\"build/classes\"]\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.units.contains_key("main"));
    }

    #[test]
    fn load_from_explicitly_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("ci-sigcheck.toml");
        std::fs::write(&custom, "[units.ci]\n").unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[units.main]\n").unwrap();
        let config = load_config_file(&custom).unwrap();
        assert!(config.units.contains_key("ci"));
        assert!(!config.units.contains_key("main"));
    }
}
