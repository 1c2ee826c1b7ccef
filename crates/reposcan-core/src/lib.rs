// SPDX-License-Identifier: Apache-2.0

//! # RepoScan Core
//!
//! Scan orchestration and finding aggregation for GitHub repositories.
//!
//! The engine runs at most one scan job at a time. A job fans out over its
//! target repositories with bounded concurrency, detects exposed secrets
//! and risky dependencies, and merges per-repository results last-write-wins
//! into an in-memory aggregate that status, findings, and the fleet
//! security score are derived from.
//!
//! ## Architecture
//!
//! - [`coordinator`] - job lifecycle: start, fan-out, cancel, poll
//! - [`store`] - single-flight job slot and result recording
//! - [`aggregator`] - last-write-wins per-repository results
//! - [`job`] / [`tracker`] - job state machine and progress counters
//! - [`worker`] - per-repository scanning behind the [`worker::RepositoryScanner`] seam
//! - [`detect`] - secret patterns and dependency advisories
//! - [`github`] - the [`github::RepositoryHost`] capability and its octocrab implementation
//! - [`facade`] - read-side views for consumers

#![warn(missing_docs)]

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod detect;
pub mod error;
pub mod facade;
pub mod findings;
pub mod github;
pub mod job;
pub mod store;
pub mod tracker;
pub mod worker;

pub use aggregator::FindingAggregator;
pub use config::{AppConfig, load_config};
pub use coordinator::ScanCoordinator;
pub use error::ScanError;
pub use facade::{RepositoryOverview, RepositoryResults};
pub use findings::{
    DependencyRisk, RepositoryScanResult, RepositoryStatus, RiskLevel, SecretFinding, Severity,
    security_score,
};
pub use github::{GitHubHost, RepoMetadata, RepositoryHost};
pub use job::{JobState, ScanProgress};
pub use store::ScanJobStore;
pub use worker::{RepositoryScanner, ScanWorker};

/// Convenience result type for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;
