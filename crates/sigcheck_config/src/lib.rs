//! Parsing and validation of `sigcheck.toml` project configuration files.
//!
//! This crate reads the project configuration file and resolves each
//! compilation unit into an immutable [`CheckConfig`], so that nothing is
//! looked up lazily once a check has started.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use resolve::{
    compile_glob, parse_class_patterns, resolve_modules, resolve_reports, resolve_unit,
    resolve_units, validate_globs, BuildModule, CacheConfig, CheckConfig, ReportConfig,
};
pub use types::*;
