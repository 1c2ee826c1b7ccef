// SPDX-License-Identifier: Apache-2.0

//! Scan job coordinator: fan-out, timeouts, and lifecycle transitions.
//!
//! Dispatch runs on a background task with bounded concurrency. Each
//! repository future first checks for a pending cancel request, then scans
//! under a timeout; failures and timeouts degrade to zero-finding results
//! with an error marker so one bad repository never sinks the job.

use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::findings::RepositoryScanResult;
use crate::github::{RepoMetadata, RepositoryHost};
use crate::job::{ScanJob, ScanProgress};
use crate::store::ScanJobStore;
use crate::worker::{RepositoryScanner, ScanWorker};

/// Orchestrates scan jobs over a repository host and a scanner.
pub struct ScanCoordinator {
    store: Arc<ScanJobStore>,
    host: Arc<dyn RepositoryHost>,
    scanner: Arc<dyn RepositoryScanner>,
    config: ScanConfig,
}

impl ScanCoordinator {
    /// Creates a coordinator with an explicit scanner implementation.
    #[must_use]
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        scanner: Arc<dyn RepositoryScanner>,
        config: ScanConfig,
    ) -> Self {
        Self {
            store: Arc::new(ScanJobStore::new()),
            host,
            scanner,
            config,
        }
    }

    /// Creates a coordinator using the default [`ScanWorker`].
    #[must_use]
    pub fn with_default_worker(host: Arc<dyn RepositoryHost>, config: ScanConfig) -> Self {
        let scanner = Arc::new(ScanWorker::new(
            Arc::clone(&host),
            config.max_file_size_bytes,
        ));
        Self::new(host, scanner, config)
    }

    /// The host this coordinator reads repositories through.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn RepositoryHost> {
        &self.host
    }

    /// The store holding the active job slot and aggregated results.
    #[must_use]
    pub fn store(&self) -> &Arc<ScanJobStore> {
        &self.store
    }

    /// Starts a scan job over the given repositories.
    ///
    /// An empty `repository_ids` means scan everything the host lists.
    /// Unknown identifiers are skipped, not fatal. The job is activated
    /// before this returns, so the single-flight check and the returned id
    /// are race-free; scanning itself proceeds on a background task.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ListingUnavailable`] when the target set cannot
    /// be resolved (no job is created), or
    /// [`ScanError::JobAlreadyRunning`] when an unsettled job exists.
    #[instrument(skip(self), fields(requested = repository_ids.len()))]
    pub async fn start_scan(&self, repository_ids: Vec<String>) -> Result<Uuid, ScanError> {
        let targets = self.resolve_targets(repository_ids).await?;
        let job = Arc::new(ScanJob::new(targets));
        let job_id = job.id();

        self.store.try_activate(Arc::clone(&job))?;

        let store = Arc::clone(&self.store);
        let scanner = Arc::clone(&self.scanner);
        let concurrency = self.config.worker_pool_size.max(1);
        let timeout = self.config.repository_timeout();

        tokio::spawn(async move {
            dispatch(&store, &scanner, &job, concurrency, timeout).await;
        });

        Ok(job_id)
    }

    /// Requests cancellation of the active job.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoActiveJob`] when nothing is running.
    pub fn cancel_scan(&self) -> Result<Uuid, ScanError> {
        self.store.cancel_active()
    }

    /// Polls the active job's progress; `None` when nothing is running.
    #[must_use]
    pub fn poll_status(&self) -> Option<ScanProgress> {
        self.store.poll_status()
    }

    async fn resolve_targets(
        &self,
        repository_ids: Vec<String>,
    ) -> Result<Vec<RepoMetadata>, ScanError> {
        let listing = if repository_ids.is_empty() {
            self.host.list_repositories().await
        } else {
            self.host.repositories_by_ids(&repository_ids).await
        };

        listing.map_err(|e| ScanError::ListingUnavailable {
            message: e.to_string(),
        })
    }
}

/// Runs one job to settlement: bounded fan-out, then finalize.
async fn dispatch(
    store: &Arc<ScanJobStore>,
    scanner: &Arc<dyn RepositoryScanner>,
    job: &Arc<ScanJob>,
    concurrency: usize,
    timeout: std::time::Duration,
) {
    let targets = job.targets().to_vec();

    let mut results = stream::iter(targets)
        .map(|repo| {
            let store = Arc::clone(store);
            let scanner = Arc::clone(scanner);
            let job = Arc::clone(job);
            async move {
                if job.cancel_requested() {
                    return;
                }

                let result = match tokio::time::timeout(timeout, scanner.scan_repository(&repo))
                    .await
                {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        warn!(repository = %repo.full_name, error = %e, "Repository scan failed");
                        RepositoryScanResult::failed(repo.id.clone(), e.to_string())
                    }
                    Err(_) => {
                        warn!(repository = %repo.full_name, "Repository scan timed out");
                        RepositoryScanResult::failed(repo.id.clone(), "scan timed out")
                    }
                };

                store.record_completed(&job, result);
            }
        })
        .buffer_unordered(concurrency);

    while results.next().await.is_some() {}

    let state = store.finalize(job);
    let progress = job.progress();
    info!(
        job_id = %job.id(),
        ?state,
        scanned = progress.scanned_count,
        secrets = progress.secrets_found,
        dependency_risks = progress.dependency_risks_found,
        "Scan job dispatch finished"
    );
}
