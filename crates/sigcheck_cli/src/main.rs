//! sigcheck CLI: inspects and maintains signature-check state for a
//! `sigcheck.toml` project.
//!
//! Provides `sigcheck plan` to show how each compilation unit would be
//! checked, and `sigcheck clean` to remove cached signatures.

#![warn(missing_docs)]

mod clean;
mod pipeline;
mod plan;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// sigcheck: API signature compatibility checking.
#[derive(Parser, Debug)]
#[command(name = "sigcheck", version, about = "API signature compatibility checker")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file to load, or a directory containing `sigcheck.toml`.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show how each unit would be checked, without checking.
    Plan(PlanArgs),
    /// Remove cached signatures.
    Clean(CleanArgs),
}

/// Arguments for the `sigcheck plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Units to plan (default: all declared units).
    pub units: Vec<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `sigcheck clean` subcommand.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Units whose cached signatures to remove (default: all declared units).
    pub units: Vec<String>,
}

/// Command output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Plan(ref args) => plan::run(args, &global),
        Command::Clean(ref args) => clean::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log level for the given flags; `RUST_LOG` takes precedence.
fn default_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(quiet, verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_plan_default() {
        let cli = Cli::parse_from(["sigcheck", "plan"]);
        match cli.command {
            Command::Plan(ref args) => {
                assert!(args.units.is_empty());
                assert_eq!(args.format, OutputFormat::Text);
            }
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn parse_plan_with_units_and_format() {
        let cli = Cli::parse_from(["sigcheck", "plan", "main", "test", "--format", "json"]);
        match cli.command {
            Command::Plan(ref args) => {
                assert_eq!(args.units, vec!["main", "test"]);
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn parse_clean_units() {
        let cli = Cli::parse_from(["sigcheck", "clean", "main"]);
        match cli.command {
            Command::Clean(ref args) => assert_eq!(args.units, vec!["main"]),
            _ => panic!("expected Clean command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["sigcheck", "--quiet", "clean"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_config_path_after_subcommand() {
        let cli = Cli::parse_from(["sigcheck", "plan", "--config", "/path/to/sigcheck.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/sigcheck.toml"));
    }

    #[test]
    fn log_level_from_flags() {
        assert_eq!(default_level(false, false), "info");
        assert_eq!(default_level(false, true), "debug");
        assert_eq!(default_level(true, true), "error");
    }
}
