//! Shared helpers for CLI commands: project root resolution and unit
//! selection.

use std::path::{Path, PathBuf};

use sigcheck_config::{load_config, load_config_file, ConfigError, ProjectConfig, CONFIG_FILE};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing
/// `sigcheck.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root and loads its configuration.
///
/// If `--config` names a file, that file is loaded whatever its name and its
/// directory is the project root. If it names a directory, that directory's
/// `sigcheck.toml` is loaded. Otherwise walks up from the current directory
/// looking for `sigcheck.toml`.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, ProjectConfig), Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            let root = p
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let config = load_config_file(&p)?;
            return Ok((root, config));
        }
        let config = load_config(&p)?;
        return Ok((p, config));
    }
    let root = find_project_root(&std::env::current_dir()?)?;
    let config = load_config(&root)?;
    Ok((root, config))
}

/// Returns the requested unit names, or every declared unit when none are
/// requested. Unknown names are an error.
pub fn select_units(
    config: &ProjectConfig,
    requested: &[String],
) -> Result<Vec<String>, ConfigError> {
    if requested.is_empty() {
        return Ok(config.units.keys().cloned().collect());
    }
    for name in requested {
        if !config.units.contains_key(name) {
            return Err(ConfigError::UnknownUnit(name.clone()));
        }
    }
    Ok(requested.to_vec())
}
