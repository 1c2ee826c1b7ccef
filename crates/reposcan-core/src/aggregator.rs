// SPDX-License-Identifier: Apache-2.0

//! Last-write-wins store of per-repository scan results.
//!
//! The aggregator keeps exactly one result per repository - the most recent
//! one. Status and the fleet score are derived from it on every query.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::findings::{RepositoryScanResult, RepositoryStatus, security_score};

/// Aggregated results across all scan jobs, past and present.
#[derive(Debug, Default)]
pub struct FindingAggregator {
    results: Mutex<HashMap<String, RepositoryScanResult>>,
}

impl FindingAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a repository result, replacing any previous one wholesale.
    ///
    /// Re-recording an identical result is a no-op in effect, so replaying
    /// a merge is safe.
    pub fn merge(&self, result: RepositoryScanResult) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(result.repository_id.clone(), result);
    }

    /// Returns the latest result for a repository, if one exists.
    #[must_use]
    pub fn result_for(&self, repository_id: &str) -> Option<RepositoryScanResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(repository_id)
            .cloned()
    }

    /// Derives a repository's status from stored results.
    ///
    /// `actively_scanning` reflects the caller's knowledge of the live job:
    /// when true it wins over any stored result, so a previously scanned
    /// repository shows as scanning while a new job covers it.
    #[must_use]
    pub fn derive_status(&self, repository_id: &str, actively_scanning: bool) -> RepositoryStatus {
        if actively_scanning {
            return RepositoryStatus::Scanning;
        }
        match self.result_for(repository_id) {
            None => RepositoryStatus::Never,
            Some(result) if result.finding_count() == 0 => RepositoryStatus::Clean,
            Some(_) => RepositoryStatus::Issues,
        }
    }

    /// Computes the fleet security score over the given repository set.
    ///
    /// Repositories without a stored result contribute zero findings but
    /// still count toward the denominator.
    #[must_use]
    pub fn compute_score(&self, repository_ids: &[String]) -> u8 {
        let results = self.results.lock().unwrap_or_else(PoisonError::into_inner);

        let mut secrets = 0;
        let mut dependency_risks = 0;
        for id in repository_ids {
            if let Some(result) = results.get(id) {
                secrets += result.secrets.len();
                dependency_risks += result.dependencies.len();
            }
        }

        security_score(secrets, dependency_risks, repository_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::{SecretFinding, Severity};

    fn secret(file: &str) -> SecretFinding {
        SecretFinding {
            id: "x".to_string(),
            credential_type: "Access Key".to_string(),
            provider: "AWS".to_string(),
            file: file.to_string(),
            line: 1,
            severity: Severity::High,
            redacted_value: "AKIA****".to_string(),
            description: String::new(),
            remediation: String::new(),
        }
    }

    #[test]
    fn test_merge_replaces_wholesale() {
        let aggregator = FindingAggregator::new();
        aggregator.merge(RepositoryScanResult::new(
            "r1",
            vec![secret("a.py"), secret("b.py")],
            Vec::new(),
        ));
        aggregator.merge(RepositoryScanResult::new("r1", Vec::new(), Vec::new()));

        let result = aggregator.result_for("r1").unwrap();
        assert_eq!(result.finding_count(), 0, "Old findings must not linger");
    }

    #[test]
    fn test_merge_same_result_twice_changes_nothing() {
        let aggregator = FindingAggregator::new();
        let result = RepositoryScanResult::new("r1", vec![secret("a.py")], Vec::new());
        aggregator.merge(result.clone());

        let ids = vec!["r1".to_string()];
        let status = aggregator.derive_status("r1", false);
        let score = aggregator.compute_score(&ids);

        aggregator.merge(result);

        assert_eq!(aggregator.derive_status("r1", false), status);
        assert_eq!(aggregator.compute_score(&ids), score);
        assert_eq!(aggregator.result_for("r1").unwrap().secrets.len(), 1);
    }

    #[test]
    fn test_status_derivation() {
        let aggregator = FindingAggregator::new();
        assert_eq!(
            aggregator.derive_status("r1", false),
            RepositoryStatus::Never
        );

        aggregator.merge(RepositoryScanResult::new("r1", Vec::new(), Vec::new()));
        assert_eq!(
            aggregator.derive_status("r1", false),
            RepositoryStatus::Clean
        );

        aggregator.merge(RepositoryScanResult::new(
            "r1",
            vec![secret("a.py")],
            Vec::new(),
        ));
        assert_eq!(
            aggregator.derive_status("r1", false),
            RepositoryStatus::Issues
        );

        // An active job covering the repository overrides the stored result.
        assert_eq!(
            aggregator.derive_status("r1", true),
            RepositoryStatus::Scanning
        );
    }

    #[test]
    fn test_failed_result_counts_as_clean_scan() {
        let aggregator = FindingAggregator::new();
        aggregator.merge(RepositoryScanResult::failed("r1", "listing failed"));
        assert_eq!(
            aggregator.derive_status("r1", false),
            RepositoryStatus::Clean
        );
    }

    #[test]
    fn test_score_counts_unscanned_repositories() {
        let aggregator = FindingAggregator::new();
        aggregator.merge(RepositoryScanResult::new(
            "r1",
            vec![secret("a.py")],
            Vec::new(),
        ));

        let ids = vec!["r1".to_string(), "r2".to_string()];
        // 100 - (1/2 * 20) = 90
        assert_eq!(aggregator.compute_score(&ids), 90);
    }

    #[test]
    fn test_score_empty_fleet_is_perfect() {
        let aggregator = FindingAggregator::new();
        assert_eq!(aggregator.compute_score(&[]), 100);
    }
}
