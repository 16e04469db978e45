//! Harbor backend
//!
//! Repositories are grouped under projects. A registry-wide listing enumerates
//! projects and then lists each project's repositories, several projects at a
//! time. Harbor has no cursor links; pages are counted and an empty page ends
//! the listing.

use super::RegistryBackend;
use super::client::{PAGE_SIZE, RegistryClient};
use super::pagination::{PageNumberPages, collect_pages};
use crate::concurrency::BoundedExecutor;
use crate::config::BackendType;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(default)]
    tags: Option<Vec<ArtifactTag>>,
}

#[derive(Debug, Deserialize)]
struct ArtifactTag {
    name: String,
}

pub struct HarborBackend {
    client: Arc<RegistryClient>,
    discovery: BoundedExecutor,
}

impl HarborBackend {
    pub fn new(client: Arc<RegistryClient>, discovery_concurrency: usize) -> Self {
        Self {
            client,
            discovery: BoundedExecutor::new(discovery_concurrency),
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<String>> {
        let mut pages = PageNumberPages::new(
            &self.client,
            "/api/v2.0/projects".to_string(),
            "Harbor project listing".to_string(),
            PAGE_SIZE,
        );
        collect_pages(&mut pages).await
    }

    /// Full repository names (`project/...`) of one project
    pub async fn list_project_repositories(&self, project: &str) -> Result<Vec<String>> {
        let mut pages = PageNumberPages::new(
            &self.client,
            format!("/api/v2.0/projects/{}/repositories", urlencoding::encode(project)),
            format!("Harbor repository listing for project {}", project),
            PAGE_SIZE,
        );
        collect_pages(&mut pages).await
    }

    async fn list_all_repositories(&self) -> Result<BTreeSet<String>> {
        let projects = self.list_projects().await?;
        self.client.output().verbose(&format!(
            "Listing repositories of {} projects ({} at a time)",
            projects.len(),
            self.discovery.limit()
        ));

        let per_project = self
            .discovery
            .try_run_all(projects, |project| async move {
                self.list_project_repositories(&project).await
            })
            .await?;

        Ok(per_project.into_iter().flatten().collect())
    }
}

/// `team/sub/` becomes (`team`, `team/sub/`): the project to list and the
/// literal name prefix to filter on. A bare project yields no filter.
pub fn split_prefix(prefix: &str) -> (String, Option<String>) {
    let trimmed = prefix.strip_suffix('/').unwrap_or(prefix);
    match trimmed.split_once('/') {
        Some((project, _)) => (project.to_string(), Some(format!("{}/", trimmed))),
        None => (trimmed.to_string(), None),
    }
}

#[async_trait]
impl RegistryBackend for HarborBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Harbor
    }

    async fn list_repositories(&self, prefix: &str) -> Result<BTreeSet<String>> {
        if prefix.is_empty() {
            return self.list_all_repositories().await;
        }

        let (project, filter) = split_prefix(prefix);
        let repositories = self.list_project_repositories(&project).await?;

        Ok(repositories
            .into_iter()
            .filter(|name| filter.as_ref().is_none_or(|f| name.starts_with(f.as_str())))
            .collect())
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        self.client.list_tags(repository).await
    }

    async fn latest_tag(&self, repository: &str) -> Result<String> {
        let (project, repo) = repository
            .split_once('/')
            .ok_or_else(|| SyncError::InvalidPath(repository.to_string()))?;

        // Harbor decodes the repository segment twice, so nested names arrive as %252F
        let url = self.client.url(&format!(
            "/api/v2.0/projects/{}/repositories/{}/artifacts?page=1&page_size=1&with_tag=true&sort=creation_time%20desc",
            urlencoding::encode(project),
            urlencoding::encode(&urlencoding::encode(repo))
        ));

        let (artifacts, _): (Vec<Artifact>, _) = self
            .client
            .get_json(&url, &format!("Harbor artifact listing for {}", repository))
            .await?;

        artifacts
            .into_iter()
            .next()
            .and_then(|artifact| artifact.tags.unwrap_or_default().into_iter().next())
            .map(|tag| tag.name)
            .ok_or_else(|| SyncError::NotFound(repository.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_prefix() {
        assert_eq!(split_prefix("library/"), ("library".to_string(), None));
        assert_eq!(split_prefix("library"), ("library".to_string(), None));
        assert_eq!(
            split_prefix("team/sub/"),
            ("team".to_string(), Some("team/sub/".to_string()))
        );
        assert_eq!(
            split_prefix("team/sub/deep"),
            ("team".to_string(), Some("team/sub/deep/".to_string()))
        );
    }

    #[test]
    fn test_artifact_without_tags_decodes() {
        let artifacts: Vec<Artifact> =
            serde_json::from_str(r#"[{"digest":"sha256:abc","tags":null}]"#).unwrap();
        assert!(artifacts[0].tags.is_none());
    }
}
