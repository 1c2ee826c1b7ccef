// SPDX-License-Identifier: Apache-2.0

//! `scan run` command handler.
//!
//! Drives one scan job to settlement: starts it, polls progress into an
//! indicatif bar, and turns Ctrl-C into a cooperative cancel request.
//! When the job settles the full report is rendered from the aggregate.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::debug;

use crate::cli::OutputContext;
use crate::output;
use reposcan_core::coordinator::ScanCoordinator;
use reposcan_core::facade::{RepositoryOverview, RepositoryResults};
use reposcan_core::github::{RepositoryHost, auth};
use reposcan_core::job::ScanProgress;
use reposcan_core::{AppConfig, GitHubHost};

/// Poll interval while a scan is in flight.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Findings for one repository, keyed for rendering.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFindings {
    /// Repository full name.
    pub repository: String,
    /// Findings stored for the repository.
    #[serde(flatten)]
    pub results: RepositoryResults,
}

/// Complete report for one finished scan run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Job identifier.
    pub job_id: String,
    /// Whether the run was cancelled before covering every target.
    pub cancelled: bool,
    /// Final progress counters.
    pub progress: ScanProgress,
    /// All repositories with their derived status and counts.
    pub repositories: Vec<RepositoryOverview>,
    /// Per-repository findings, only for repositories with findings.
    pub findings: Vec<RepositoryFindings>,
    /// Fleet security score (0-100).
    pub security_score: u8,
}

/// Runs a scan to settlement and renders the report.
pub async fn run_scan(
    repos: Vec<String>,
    details: bool,
    ctx: &OutputContext,
    config: &AppConfig,
) -> Result<()> {
    let client = auth::create_client()?;
    let host: Arc<dyn RepositoryHost> = Arc::new(GitHubHost::new(client, &config.github));
    let coordinator = ScanCoordinator::with_default_worker(host, config.scan.clone());

    let job_id = coordinator.start_scan(repos).await?;
    debug!(%job_id, "Scan job started");

    let (last_progress, cancelled) = watch_progress(&coordinator, ctx).await;

    let repositories = coordinator.repositories_with_status().await?;
    let security_score = coordinator.security_score().await?;

    let findings = repositories
        .iter()
        .filter(|o| o.secrets_count > 0 || o.dependency_risks_count > 0)
        .map(|o| RepositoryFindings {
            repository: o.repository.full_name.clone(),
            results: coordinator.repository_results(&o.repository.id),
        })
        .collect();

    let report = ScanReport {
        job_id: job_id.to_string(),
        cancelled,
        progress: last_progress,
        repositories,
        findings,
        security_score,
    };

    output::render_scan_report(&report, details, ctx);
    Ok(())
}

/// Polls the job until it settles, feeding an optional progress bar.
///
/// Returns the last observed progress and whether a cancel was requested.
async fn watch_progress(
    coordinator: &ScanCoordinator,
    ctx: &OutputContext,
) -> (ScanProgress, bool) {
    let mut bar: Option<ProgressBar> = None;
    let mut cancelled = false;
    let mut last = ScanProgress {
        progress_percent: 0,
        scanned_count: 0,
        total_count: 0,
        secrets_found: 0,
        dependency_risks_found: 0,
        completed: false,
    };

    loop {
        match coordinator.poll_status() {
            Some(progress) => {
                last = progress;
                if progress.completed {
                    break;
                }
                if ctx.is_interactive() {
                    let bar = bar.get_or_insert_with(|| {
                        let b = ProgressBar::new(progress.total_count as u64);
                        b.set_style(
                            ProgressStyle::default_bar()
                                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                                .expect("Invalid progress template"),
                        );
                        b
                    });
                    bar.set_position(progress.scanned_count as u64);
                    bar.set_message(format!(
                        "{} secrets, {} dependency risks",
                        progress.secrets_found, progress.dependency_risks_found
                    ));
                }
            }
            // The slot is vacated once terminal progress was delivered (or
            // immediately on cancellation); `last` holds the final counters.
            None => break,
        }

        tokio::select! {
            () = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = tokio::signal::ctrl_c(), if !cancelled => {
                if coordinator.cancel_scan().is_ok() {
                    cancelled = true;
                    if let Some(b) = &bar {
                        b.set_message("Cancelling - letting in-flight repositories finish");
                    }
                }
            }
        }
    }

    if let Some(b) = bar {
        b.finish_and_clear();
    }

    (last, cancelled)
}
