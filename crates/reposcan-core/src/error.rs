// SPDX-License-Identifier: Apache-2.0

//! Error types for RepoScan.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.
//!
//! Failures local to a single repository are deliberately *not* part of this
//! taxonomy: a failed repository scan is recorded as a zero-finding result
//! carrying an error marker and never fails the job.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during RepoScan operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A scan job is already running or cancelling - only one job may be
    /// active at a time.
    #[error("a scan job is already active ({job_id}) - cancel it or wait for completion")]
    JobAlreadyRunning {
        /// Identifier of the job currently holding the active slot.
        job_id: Uuid,
    },

    /// Cancel was requested but no job is running or cancelling.
    #[error("no scan job is currently active")]
    NoActiveJob,

    /// The repository-listing collaborator is unreachable - the job never
    /// starts and the engine stays idle.
    #[error("repository listing unavailable: {message}")]
    ListingUnavailable {
        /// Error message from the upstream host.
        message: String,
    },

    /// GitHub API error from octocrab.
    #[error("GitHub API error: {message}")]
    GitHub {
        /// Error message.
        message: String,
    },

    /// No GitHub token could be resolved from any source.
    #[error("authentication required - set GITHUB_TOKEN or authenticate with `gh auth login`")]
    NotAuthenticated,

    /// Configuration file error.
    #[error("configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },
}

impl From<octocrab::Error> for ScanError {
    fn from(err: octocrab::Error) -> Self {
        ScanError::GitHub {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for ScanError {
    fn from(err: config::ConfigError) -> Self {
        ScanError::Config {
            message: err.to_string(),
        }
    }
}
