// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the RepoScan CLI.

pub mod repo;
pub mod scan;

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{Commands, OutputContext, RepoCommand, ScanCommand};
use reposcan_core::AppConfig;

/// Creates a styled spinner (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if ctx.is_interactive() {
        let s = ProgressBar::new_spinner();
        s.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        s.set_message(message.to_string());
        s.enable_steady_tick(Duration::from_millis(100));
        Some(s)
    } else {
        None
    }
}

/// Dispatch to the appropriate command handler.
pub async fn run(command: Commands, ctx: OutputContext, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Repo(repo_cmd) => match repo_cmd {
            RepoCommand::List => repo::run_list(&ctx, config).await,
        },

        Commands::Scan(scan_cmd) => match scan_cmd {
            ScanCommand::Run { repos, details } => {
                scan::run_scan(repos, details, &ctx, config).await
            }
        },
    }
}
