// SPDX-License-Identifier: Apache-2.0

//! Octocrab-backed implementation of the [`RepositoryHost`] capability.
//!
//! Repository trees are walked through the contents API, one directory per
//! request, mirroring how the hosting API exposes them. Vendored and
//! generated directories are pruned before descending.

use async_trait::async_trait;
use octocrab::Octocrab;
use secrecy::SecretString;
use tracing::{debug, instrument, warn};

use crate::config::GitHubConfig;
use crate::error::ScanError;
use crate::github::auth::create_client_with_token;
use crate::github::{RepoFile, RepoMetadata, RepositoryHost};

/// GitHub implementation of [`RepositoryHost`].
pub struct GitHubHost {
    client: Octocrab,
    page_size: u8,
    skip_directories: Vec<String>,
}

impl GitHubHost {
    /// Creates a host from an existing octocrab client.
    #[must_use]
    pub fn new(client: Octocrab, config: &GitHubConfig) -> Self {
        Self {
            client,
            page_size: config.page_size,
            skip_directories: config.skip_directories.clone(),
        }
    }

    /// Creates a host from a personal access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the octocrab client cannot be built.
    pub fn from_token(token: &SecretString, config: &GitHubConfig) -> Result<Self, ScanError> {
        Ok(Self::new(create_client_with_token(token)?, config))
    }

    fn should_skip_directory(&self, name: &str) -> bool {
        self.skip_directories.iter().any(|d| d == name)
    }

    /// Lists the contents of one directory, or the repository root when
    /// `dir` is empty.
    async fn directory_contents(
        &self,
        owner: &str,
        name: &str,
        dir: &str,
    ) -> Result<Vec<octocrab::models::repos::Content>, octocrab::Error> {
        let handler = self.client.repos(owner, name);
        let mut request = handler.get_content();
        if !dir.is_empty() {
            request = request.path(dir);
        }
        Ok(request.send().await?.items)
    }
}

/// Splits an `owner/name` string into its parts.
fn parse_full_name(full_name: &str) -> Result<(&str, &str), ScanError> {
    match full_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
        _ => Err(ScanError::GitHub {
            message: format!("invalid repository name, expected owner/name: {full_name}"),
        }),
    }
}

/// Maps an octocrab repository model into the engine's metadata type.
fn into_metadata(repo: octocrab::models::Repository) -> RepoMetadata {
    let name = repo.name.clone();
    RepoMetadata {
        id: repo.id.to_string(),
        full_name: repo.full_name.unwrap_or_else(|| name.clone()),
        name,
        description: repo.description,
        url: repo
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        is_private: repo.private.unwrap_or(false),
        language: repo
            .language
            .as_ref()
            .and_then(|v| v.as_str())
            .map(ToString::to_string),
        updated_at: repo.updated_at,
    }
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    #[instrument(skip(self))]
    async fn list_repositories(&self) -> Result<Vec<RepoMetadata>, ScanError> {
        let page = self
            .client
            .current()
            .list_repos_for_authenticated_user()
            .type_("all")
            .sort("updated")
            .per_page(self.page_size)
            .send()
            .await?;

        let repos = self.client.all_pages(page).await?;
        debug!(count = repos.len(), "Listed repositories");

        Ok(repos.into_iter().map(into_metadata).collect())
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn repositories_by_ids(&self, ids: &[String]) -> Result<Vec<RepoMetadata>, ScanError> {
        let mut repos = Vec::with_capacity(ids.len());

        for id in ids {
            let fetched = if let Ok(numeric) = id.parse::<u64>() {
                self.client.repos_by_id(numeric).get().await
            } else if let Ok((owner, name)) = parse_full_name(id) {
                self.client.repos(owner, name).get().await
            } else {
                warn!(repository = %id, "Skipping unrecognized repository identifier");
                continue;
            };

            match fetched {
                Ok(repo) => repos.push(into_metadata(repo)),
                Err(e) => {
                    warn!(repository = %id, error = %e, "Failed to fetch repository, skipping");
                }
            }
        }

        Ok(repos)
    }

    #[instrument(skip(self))]
    async fn list_files(&self, full_name: &str) -> Result<Vec<RepoFile>, ScanError> {
        let (owner, name) = parse_full_name(full_name)?;

        let mut files = Vec::new();
        let mut pending = vec![String::new()];
        let mut is_root = true;

        while let Some(dir) = pending.pop() {
            let items = match self.directory_contents(owner, name, &dir).await {
                Ok(items) => items,
                // An unreadable root means the repository itself cannot be
                // scanned; an unreadable subdirectory only loses that subtree.
                Err(e) if is_root => return Err(e.into()),
                Err(e) => {
                    warn!(repository = %full_name, directory = %dir, error = %e, "Skipping unreadable directory");
                    continue;
                }
            };
            is_root = false;

            for item in items {
                match item.r#type.as_str() {
                    "file" => files.push(RepoFile {
                        size: u64::try_from(item.size).unwrap_or(0),
                        path: item.path,
                        name: item.name,
                    }),
                    "dir" if !self.should_skip_directory(&item.name) => {
                        pending.push(item.path);
                    }
                    _ => {}
                }
            }
        }

        debug!(repository = %full_name, count = files.len(), "Walked repository tree");
        Ok(files)
    }

    #[instrument(skip(self))]
    async fn file_content(
        &self,
        full_name: &str,
        path: &str,
    ) -> Result<Option<String>, ScanError> {
        let (owner, name) = parse_full_name(full_name)?;

        let contents = match self
            .client
            .repos(owner, name)
            .get_content()
            .path(path)
            .send()
            .await
        {
            Ok(contents) => contents,
            Err(e) => {
                warn!(repository = %full_name, file = %path, error = %e, "Failed to read file content");
                return Ok(None);
            }
        };

        Ok(contents
            .items
            .into_iter()
            .next()
            .and_then(|item| item.decoded_content()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_name_valid() {
        let (owner, name) = parse_full_name("octocat/Hello-World").unwrap();
        assert_eq!(owner, "octocat");
        assert_eq!(name, "Hello-World");
    }

    #[test]
    fn test_parse_full_name_rejects_missing_parts() {
        assert!(parse_full_name("octocat").is_err());
        assert!(parse_full_name("/repo").is_err());
        assert!(parse_full_name("owner/").is_err());
    }

    #[tokio::test]
    async fn test_should_skip_directory() {
        let host = GitHubHost::new(
            Octocrab::builder().build().unwrap(),
            &GitHubConfig::default(),
        );
        assert!(host.should_skip_directory("node_modules"));
        assert!(host.should_skip_directory(".git"));
        assert!(!host.should_skip_directory("src"));
    }
}
