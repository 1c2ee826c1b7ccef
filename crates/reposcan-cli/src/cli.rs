// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for RepoScan.
//!
//! Uses clap's derive API with hierarchical noun-verb subcommands.

use std::io::IsTerminal;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI results.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
}

/// Global output configuration passed to commands.
#[derive(Clone)]
pub struct OutputContext {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Suppress non-essential output (spinners, progress)
    pub quiet: bool,
    /// Enable verbose output
    pub verbose: bool,
    /// Whether stdout is a terminal (TTY)
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    /// Returns true if interactive elements (spinners, progress bars) should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && !self.quiet && matches!(self.format, OutputFormat::Text)
    }
}

/// RepoScan - scan GitHub repositories for secrets and risky dependencies.
///
/// Lists your repositories, fans out scans with bounded concurrency, and
/// reports exposed credentials, vulnerable packages, and a fleet security
/// score.
#[derive(Parser)]
#[command(name = "reposcan")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format (text, json)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Suppress non-essential output (spinners, progress)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Repository operations
    #[command(subcommand)]
    Repo(RepoCommand),

    /// Scan operations
    #[command(subcommand)]
    Scan(ScanCommand),
}

/// Repository subcommands
#[derive(Subcommand)]
pub enum RepoCommand {
    /// List repositories with their scan status and finding counts
    List,
}

/// Scan subcommands
#[derive(Subcommand)]
pub enum ScanCommand {
    /// Run a scan and report findings when it finishes
    ///
    /// Scans every accessible repository unless --repo narrows the set.
    /// Ctrl-C requests cooperative cancellation: in-flight repositories
    /// finish, the rest are skipped, and partial results are reported.
    Run {
        /// Repository to scan (id or owner/name); repeatable. Scans all
        /// repositories when omitted.
        #[arg(long = "repo", value_name = "REPO")]
        repos: Vec<String>,

        /// Include full finding details in text output
        #[arg(long)]
        details: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_run_accepts_repeated_repos() {
        let cli = Cli::try_parse_from([
            "reposcan", "scan", "run", "--repo", "1", "--repo", "acme/app",
        ])
        .unwrap();
        match cli.command {
            Commands::Scan(ScanCommand::Run { repos, details }) => {
                assert_eq!(repos, vec!["1".to_string(), "acme/app".to_string()]);
                assert!(!details);
            }
            _ => panic!("expected scan run"),
        }
    }
}
