// SPDX-License-Identifier: Apache-2.0

//! Read-side views joining host metadata with scan state.
//!
//! These are the shapes consumers render: the repository listing with
//! derived status and counts, the per-repository findings view, and the
//! fleet security score.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::coordinator::ScanCoordinator;
use crate::error::ScanError;
use crate::findings::{DependencyRisk, RepositoryStatus, SecretFinding};
use crate::github::RepoMetadata;

/// One repository in the listing, enriched with scan state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOverview {
    /// Host metadata for the repository.
    #[serde(flatten)]
    pub repository: RepoMetadata,
    /// Derived scan status.
    pub scan_status: RepositoryStatus,
    /// Secrets in the latest stored result.
    pub secrets_count: usize,
    /// Dependency risks in the latest stored result.
    pub dependency_risks_count: usize,
    /// When the latest stored result was produced, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scanned: Option<DateTime<Utc>>,
}

/// Findings for one repository.
///
/// A repository that was never scanned (or is unknown) yields empty
/// collections rather than an error.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryResults {
    /// Detected secrets.
    pub secrets: Vec<SecretFinding>,
    /// Detected dependency risks.
    pub dependencies: Vec<DependencyRisk>,
}

impl ScanCoordinator {
    /// Lists all repositories with their derived scan state.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ListingUnavailable`] when the host listing
    /// fails.
    #[instrument(skip(self))]
    pub async fn repositories_with_status(
        &self,
    ) -> Result<Vec<RepositoryOverview>, ScanError> {
        let repos = self
            .host()
            .list_repositories()
            .await
            .map_err(|e| ScanError::ListingUnavailable {
                message: e.to_string(),
            })?;

        Ok(repos
            .into_iter()
            .map(|repository| {
                let scan_status = self.store().derive_status(&repository.id);
                let result = self.store().results_for(&repository.id);
                RepositoryOverview {
                    scan_status,
                    secrets_count: result.as_ref().map_or(0, |r| r.secrets.len()),
                    dependency_risks_count: result.as_ref().map_or(0, |r| r.dependencies.len()),
                    last_scanned: result.map(|r| r.completed_at),
                    repository,
                }
            })
            .collect())
    }

    /// Returns the stored findings for one repository.
    ///
    /// Unknown or never-scanned repositories yield empty results.
    #[must_use]
    pub fn repository_results(&self, repository_id: &str) -> RepositoryResults {
        self.store()
            .results_for(repository_id)
            .map(|result| RepositoryResults {
                secrets: result.secrets,
                dependencies: result.dependencies,
            })
            .unwrap_or_default()
    }

    /// Computes the fleet security score over the host's repositories.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ListingUnavailable`] when the host listing
    /// fails.
    pub async fn security_score(&self) -> Result<u8, ScanError> {
        let repos = self
            .host()
            .list_repositories()
            .await
            .map_err(|e| ScanError::ListingUnavailable {
                message: e.to_string(),
            })?;

        let ids: Vec<String> = repos.into_iter().map(|r| r.id).collect();
        Ok(self.store().aggregator().compute_score(&ids))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::config::ScanConfig;
    use crate::findings::{RepositoryScanResult, Severity, finding_id};
    use crate::github::{RepoFile, RepositoryHost};
    use crate::worker::RepositoryScanner;

    struct FixedHost {
        repos: Vec<RepoMetadata>,
    }

    #[async_trait]
    impl RepositoryHost for FixedHost {
        async fn list_repositories(&self) -> Result<Vec<RepoMetadata>, ScanError> {
            Ok(self.repos.clone())
        }

        async fn repositories_by_ids(
            &self,
            ids: &[String],
        ) -> Result<Vec<RepoMetadata>, ScanError> {
            Ok(self
                .repos
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect())
        }

        async fn list_files(&self, _full_name: &str) -> Result<Vec<RepoFile>, ScanError> {
            Ok(Vec::new())
        }

        async fn file_content(
            &self,
            _full_name: &str,
            _path: &str,
        ) -> Result<Option<String>, ScanError> {
            Ok(None)
        }
    }

    struct NoopScanner;

    #[async_trait]
    impl RepositoryScanner for NoopScanner {
        async fn scan_repository(
            &self,
            repo: &RepoMetadata,
        ) -> Result<RepositoryScanResult, ScanError> {
            Ok(RepositoryScanResult::new(
                repo.id.clone(),
                Vec::new(),
                Vec::new(),
            ))
        }
    }

    fn repo(id: &str) -> RepoMetadata {
        RepoMetadata {
            id: id.to_string(),
            name: id.to_string(),
            full_name: format!("acme/{id}"),
            description: None,
            url: String::new(),
            is_private: false,
            language: None,
            updated_at: None,
        }
    }

    fn secret() -> SecretFinding {
        SecretFinding {
            id: finding_id(&["f", "1", "v"]),
            credential_type: "Access Key".to_string(),
            provider: "AWS".to_string(),
            file: "a.py".to_string(),
            line: 1,
            severity: Severity::High,
            redacted_value: "AKIA****".to_string(),
            description: String::new(),
            remediation: String::new(),
        }
    }

    fn coordinator(repos: Vec<RepoMetadata>) -> ScanCoordinator {
        ScanCoordinator::new(
            Arc::new(FixedHost { repos }),
            Arc::new(NoopScanner),
            ScanConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_listing_reflects_stored_results() {
        let coordinator = coordinator(vec![repo("1"), repo("2")]);
        coordinator.store().aggregator().merge(RepositoryScanResult::new(
            "1",
            vec![secret()],
            Vec::new(),
        ));

        let listing = coordinator.repositories_with_status().await.unwrap();
        assert_eq!(listing.len(), 2);

        let first = listing.iter().find(|o| o.repository.id == "1").unwrap();
        assert_eq!(first.scan_status, RepositoryStatus::Issues);
        assert_eq!(first.secrets_count, 1);
        assert!(first.last_scanned.is_some());

        let second = listing.iter().find(|o| o.repository.id == "2").unwrap();
        assert_eq!(second.scan_status, RepositoryStatus::Never);
        assert!(second.last_scanned.is_none());
    }

    #[tokio::test]
    async fn test_unknown_repository_yields_empty_results() {
        let coordinator = coordinator(vec![repo("1")]);
        let results = coordinator.repository_results("does-not-exist");
        assert!(results.secrets.is_empty());
        assert!(results.dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_security_score_over_listing() {
        let coordinator = coordinator(vec![repo("1"), repo("2")]);
        coordinator.store().aggregator().merge(RepositoryScanResult::new(
            "1",
            vec![secret()],
            Vec::new(),
        ));

        // 100 - (1/2 * 20) = 90
        assert_eq!(coordinator.security_score().await.unwrap(), 90);
    }

    #[test]
    fn test_overview_serializes_flattened() {
        let overview = RepositoryOverview {
            repository: repo("1"),
            scan_status: RepositoryStatus::Clean,
            secrets_count: 0,
            dependency_risks_count: 0,
            last_scanned: None,
        };

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["fullName"], "acme/1");
        assert_eq!(json["scanStatus"], "clean");
        assert!(json.get("lastScanned").is_none());
    }
}
