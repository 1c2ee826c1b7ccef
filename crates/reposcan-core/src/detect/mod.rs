// SPDX-License-Identifier: Apache-2.0

//! Detection engines consumed by the scan worker.
//!
//! [`secrets`] finds exposed credentials in file content; [`dependencies`]
//! flags risky packages in JavaScript manifests and lockfiles. Both are
//! pure: they take text in and return findings, leaving orchestration and
//! state to the coordinator.

pub mod dependencies;
pub mod secrets;

pub use dependencies::DependencyAnalyzer;
pub use secrets::SecretsDetector;
