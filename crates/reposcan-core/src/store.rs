// SPDX-License-Identifier: Apache-2.0

//! Single-flight job slot and result recording.
//!
//! The store owns two pieces of shared state: the active job slot (at most
//! one job at a time) and the [`FindingAggregator`]. All result recording
//! goes through [`ScanJobStore::record_completed`], which is the only
//! place a worker result touches the aggregator, the job's tracker, and
//! the job's done set - so the three can never disagree.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregator::FindingAggregator;
use crate::error::ScanError;
use crate::findings::{RepositoryScanResult, RepositoryStatus};
use crate::job::{JobState, ScanJob, ScanProgress};

/// Shared state behind the scan engine: active job slot plus aggregator.
#[derive(Debug, Default)]
pub struct ScanJobStore {
    active: Mutex<Option<Arc<ScanJob>>>,
    aggregator: FindingAggregator,
}

impl ScanJobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a job in the active slot.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::JobAlreadyRunning`] with the incumbent's id if
    /// an unsettled job already occupies the slot.
    pub fn try_activate(&self, job: Arc<ScanJob>) -> Result<(), ScanError> {
        let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = slot.as_ref()
            && !current.is_settled()
        {
            return Err(ScanError::JobAlreadyRunning {
                job_id: current.id(),
            });
        }

        info!(job_id = %job.id(), targets = job.targets().len(), "Scan job activated");
        *slot = Some(job);
        Ok(())
    }

    /// Returns the job currently in the slot, settled or not.
    #[must_use]
    pub fn active_job(&self) -> Option<Arc<ScanJob>> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records one finished repository for a job.
    ///
    /// Merges the result into the aggregator, bumps the job's counters, and
    /// marks the repository done within the job, in that order.
    pub fn record_completed(&self, job: &ScanJob, result: RepositoryScanResult) {
        let repository_id = result.repository_id.clone();
        let secrets = result.secrets.len();
        let dependency_risks = result.dependencies.len();

        debug!(
            job_id = %job.id(),
            repository = %repository_id,
            secrets,
            dependency_risks,
            failed = result.error.is_some(),
            "Recording repository result"
        );

        self.aggregator.merge(result);
        job.tracker()
            .record_repository_completed(secrets, dependency_risks);
        job.mark_done(&repository_id);
    }

    /// Settles a job after dispatch finishes.
    ///
    /// A cancelled job vacates the slot immediately; a completed job stays
    /// until a poll observes the terminal progress once.
    pub fn finalize(&self, job: &ScanJob) -> JobState {
        let state = job.finalize();

        if state == JobState::Cancelled {
            let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|j| j.id() == job.id()) {
                *slot = None;
            }
        }

        info!(job_id = %job.id(), ?state, "Scan job settled");
        state
    }

    /// Requests cancellation of the active job.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NoActiveJob`] when the slot is empty or the
    /// incumbent has already settled.
    pub fn cancel_active(&self) -> Result<Uuid, ScanError> {
        let job = self.active_job().ok_or(ScanError::NoActiveJob)?;
        if !job.request_cancel() {
            return Err(ScanError::NoActiveJob);
        }
        info!(job_id = %job.id(), "Cancellation requested");
        Ok(job.id())
    }

    /// Polls the active job's progress.
    ///
    /// Returns `None` when no job occupies the slot. The first poll that
    /// observes a completed job vacates the slot, so terminal progress is
    /// delivered exactly once and a new job may start afterwards.
    #[must_use]
    pub fn poll_status(&self) -> Option<ScanProgress> {
        let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let job = slot.as_ref()?;
        let progress = job.progress();

        if progress.completed {
            debug!(job_id = %job.id(), "Terminal progress observed, vacating slot");
            *slot = None;
        }

        Some(progress)
    }

    /// Derives a repository's status from the active job and stored results.
    #[must_use]
    pub fn derive_status(&self, repository_id: &str) -> RepositoryStatus {
        let actively_scanning = self.active_job().is_some_and(|job| {
            !job.is_settled() && job.covers(repository_id) && !job.is_done_for(repository_id)
        });
        self.aggregator.derive_status(repository_id, actively_scanning)
    }

    /// Returns the stored result for a repository, if any.
    #[must_use]
    pub fn results_for(&self, repository_id: &str) -> Option<RepositoryScanResult> {
        self.aggregator.result_for(repository_id)
    }

    /// The aggregator backing this store.
    #[must_use]
    pub fn aggregator(&self) -> &FindingAggregator {
        &self.aggregator
    }
}
