// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build a static site from a manifest of glob-driven asset stages.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the manifest (JSON or TOML).
    ///
    /// A `package.json` with a top-level `build` object is accepted as-is.
    #[arg(long, value_name = "PATH", default_value = "package.json", global = true)]
    pub config: String,

    /// Production build: optimised scripts, build-only artifacts removed.
    #[arg(long, global = true)]
    pub prod: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print derived globs and the build graph, but don't
    /// run any stage.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The selected command; `build` when none was given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Build)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Build the output tree once.
    Build,
    /// Build, then serve the output tree and rebuild on source changes.
    Start,
    /// Remove everything below the output root.
    Clean,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_the_default_command() {
        let args = CliArgs::try_parse_from(["sitepipe"]).unwrap();
        assert_eq!(args.command(), Command::Build);
        assert!(!args.prod);
        assert_eq!(args.config, "package.json");
    }

    #[test]
    fn prod_flag_is_accepted_after_the_subcommand() {
        let args = CliArgs::try_parse_from(["sitepipe", "start", "--prod"]).unwrap();
        assert_eq!(args.command(), Command::Start);
        assert!(args.prod);
    }
}
