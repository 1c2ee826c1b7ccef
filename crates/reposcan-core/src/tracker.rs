// SPDX-License-Identifier: Apache-2.0

//! Running counters for an in-flight scan job.
//!
//! Workers report completed repositories here as they finish; pollers read
//! a consistent snapshot. One tracker belongs to exactly one job and is
//! never reused.

use std::sync::Mutex;

/// Point-in-time view of a job's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Repositories whose results have been recorded so far.
    pub scanned: usize,
    /// Total secrets across recorded results.
    pub secrets: usize,
    /// Total dependency risks across recorded results.
    pub dependency_risks: usize,
    /// Whether the job has settled (completed or cancelled).
    pub completed: bool,
}

#[derive(Debug, Default)]
struct Counters {
    scanned: usize,
    secrets: usize,
    dependency_risks: usize,
    completed: bool,
}

/// Thread-safe progress counters shared between workers and pollers.
#[derive(Debug, Default)]
pub struct ScanStatusTracker {
    inner: Mutex<Counters>,
}

impl ScanStatusTracker {
    /// Creates a tracker with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished repository and its finding counts.
    pub fn record_repository_completed(&self, secrets: usize, dependency_risks: usize) {
        let mut counters = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        counters.scanned += 1;
        counters.secrets += secrets;
        counters.dependency_risks += dependency_risks;
    }

    /// Marks the job as settled. Idempotent.
    pub fn mark_completed(&self) {
        let mut counters = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        counters.completed = true;
    }

    /// Returns a consistent snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        let counters = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        StatusSnapshot {
            scanned: counters.scanned,
            secrets: counters.secrets,
            dependency_risks: counters.dependency_risks,
            completed: counters.completed,
        }
    }
}
