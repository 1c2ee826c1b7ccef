// SPDX-License-Identifier: Apache-2.0

//! `repo list` command handler.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::OutputContext;
use crate::commands::maybe_spinner;
use crate::output;
use reposcan_core::coordinator::ScanCoordinator;
use reposcan_core::github::{RepositoryHost, auth};
use reposcan_core::{AppConfig, GitHubHost};

/// Lists repositories with their derived scan state.
pub async fn run_list(ctx: &OutputContext, config: &AppConfig) -> Result<()> {
    let client = auth::create_client()?;
    let host: Arc<dyn RepositoryHost> = Arc::new(GitHubHost::new(client, &config.github));
    let coordinator = ScanCoordinator::with_default_worker(host, config.scan.clone());

    let spinner = maybe_spinner(ctx, "Fetching repositories...");
    let listing = coordinator.repositories_with_status().await?;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    debug!(count = listing.len(), "Fetched repositories");

    output::render_repos(&listing, ctx);
    Ok(())
}
