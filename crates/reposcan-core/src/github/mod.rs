// SPDX-License-Identifier: Apache-2.0

//! GitHub integration module.
//!
//! Defines the [`RepositoryHost`] capability the scan engine consumes -
//! listing repositories and reading repository contents - together with the
//! octocrab-backed implementation in [`host`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

pub mod auth;
pub mod host;

pub use host::GitHubHost;

/// Metadata for a repository known to the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoMetadata {
    /// Provider-assigned repository identifier.
    pub id: String,
    /// Short repository name.
    pub name: String,
    /// Full name in `owner/name` form.
    pub full_name: String,
    /// Short description, when set.
    pub description: Option<String>,
    /// Web URL.
    pub url: String,
    /// Whether the repository is private.
    pub is_private: bool,
    /// Primary programming language, when detected.
    pub language: Option<String>,
    /// Last update timestamp, when known.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A file entry discovered while walking a repository tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    /// Path relative to the repository root.
    pub path: String,
    /// File name without directories.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
}

/// Read access to a source-hosting provider.
///
/// The engine consumes this capability for repository discovery and content
/// reads; the octocrab-backed [`GitHubHost`] is the production
/// implementation, and tests substitute in-memory fakes.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Lists all repositories accessible to the authenticated user.
    async fn list_repositories(&self) -> Result<Vec<RepoMetadata>, ScanError>;

    /// Fetches metadata for specific repositories by identifier.
    ///
    /// Identifiers that cannot be resolved are skipped rather than failing
    /// the whole lookup.
    async fn repositories_by_ids(&self, ids: &[String]) -> Result<Vec<RepoMetadata>, ScanError>;

    /// Recursively lists files in a repository, skipping vendored and
    /// generated directories.
    async fn list_files(&self, full_name: &str) -> Result<Vec<RepoFile>, ScanError>;

    /// Reads the decoded content of one file, or `None` when the file is
    /// missing or not text.
    async fn file_content(&self, full_name: &str, path: &str)
    -> Result<Option<String>, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_metadata_serialization_uses_camel_case() {
        let repo = RepoMetadata {
            id: "1296269".to_string(),
            name: "Hello-World".to_string(),
            full_name: "octocat/Hello-World".to_string(),
            description: Some("My first repository".to_string()),
            url: "https://github.com/octocat/Hello-World".to_string(),
            is_private: false,
            language: Some("Rust".to_string()),
            updated_at: None,
        };

        let json = serde_json::to_value(&repo).unwrap();
        assert_eq!(json["fullName"], "octocat/Hello-World");
        assert_eq!(json["isPrivate"], false);
    }
}
