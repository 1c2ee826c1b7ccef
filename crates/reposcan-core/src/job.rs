// SPDX-License-Identifier: Apache-2.0

//! Scan job identity, lifecycle state, and progress reporting.
//!
//! A job moves `Running -> Completed`, or `Running -> Cancelling ->
//! Cancelled` when a cancel request arrives first. Cancellation is
//! cooperative: workers check [`ScanJob::cancel_requested`] between
//! repositories and an in-flight repository is allowed to finish.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use crate::github::RepoMetadata;
use crate::tracker::ScanStatusTracker;

/// Lifecycle state of a scan job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Workers are dispatching and recording results.
    Running,
    /// Cancellation requested; remaining repositories will be skipped.
    Cancelling,
    /// All targeted repositories were processed.
    Completed,
    /// The job stopped early after a cancel request.
    Cancelled,
}

/// Externally visible progress of a job.
///
/// `progress_percent` reaches 100 only when `completed` is true; a running
/// job with every repository recorded still reports 99 until the job
/// settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// Integer completion percentage, 0 to 100.
    pub progress_percent: u8,
    /// Repositories recorded so far.
    pub scanned_count: usize,
    /// Repositories the job targets.
    pub total_count: usize,
    /// Secrets found so far.
    pub secrets_found: usize,
    /// Dependency risks found so far.
    pub dependency_risks_found: usize,
    /// Whether the job has settled.
    pub completed: bool,
}

/// One scan job: its identity, targets, state, and counters.
#[derive(Debug)]
pub struct ScanJob {
    id: Uuid,
    targets: Vec<RepoMetadata>,
    state: Mutex<JobState>,
    tracker: ScanStatusTracker,
    done: Mutex<HashSet<String>>,
}

impl ScanJob {
    /// Creates a running job over the given targets.
    #[must_use]
    pub fn new(targets: Vec<RepoMetadata>) -> Self {
        Self {
            id: Uuid::new_v4(),
            targets,
            state: Mutex::new(JobState::Running),
            tracker: ScanStatusTracker::new(),
            done: Mutex::new(HashSet::new()),
        }
    }

    /// The job's unique identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Repositories this job targets.
    #[must_use]
    pub fn targets(&self) -> &[RepoMetadata] {
        &self.targets
    }

    /// The job's progress counters.
    #[must_use]
    pub fn tracker(&self) -> &ScanStatusTracker {
        &self.tracker
    }

    /// Requests cooperative cancellation.
    ///
    /// Returns `true` if the job was running or already cancelling, `false`
    /// if it had already settled.
    pub fn request_cancel(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            JobState::Running => {
                *state = JobState::Cancelling;
                true
            }
            JobState::Cancelling => true,
            JobState::Completed | JobState::Cancelled => false,
        }
    }

    /// Whether workers should stop picking up new repositories.
    #[must_use]
    pub fn cancel_requested(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            JobState::Cancelling | JobState::Cancelled
        )
    }

    /// Settles the job once dispatch is finished.
    ///
    /// Returns the final state: `Cancelled` when a cancel request arrived
    /// during the run, `Completed` otherwise.
    pub fn finalize(&self) -> JobState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = match *state {
            JobState::Cancelling | JobState::Cancelled => JobState::Cancelled,
            JobState::Running | JobState::Completed => JobState::Completed,
        };
        self.tracker.mark_completed();
        *state
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the job has settled (completed or cancelled).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.state(), JobState::Completed | JobState::Cancelled)
    }

    /// Whether this job targets the given repository.
    #[must_use]
    pub fn covers(&self, repository_id: &str) -> bool {
        self.targets.iter().any(|r| r.id == repository_id)
    }

    /// Marks a targeted repository as recorded within this job.
    pub fn mark_done(&self, repository_id: &str) {
        self.done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(repository_id.to_string());
    }

    /// Whether this job has already recorded the given repository.
    #[must_use]
    pub fn is_done_for(&self, repository_id: &str) -> bool {
        self.done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(repository_id)
    }

    /// Computes the job's externally visible progress.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn progress(&self) -> ScanProgress {
        let snapshot = self.tracker.snapshot();
        let total = self.targets.len();

        let progress_percent = if snapshot.completed {
            100
        } else if total == 0 {
            0
        } else {
            // Floor, then hold below 100 until the job settles.
            ((snapshot.scanned * 100 / total) as u8).min(99)
        };

        ScanProgress {
            progress_percent,
            scanned_count: snapshot.scanned,
            total_count: total,
            secrets_found: snapshot.secrets,
            dependency_risks_found: snapshot.dependency_risks,
            completed: snapshot.completed,
        }
    }
}
