//! Docker Registry v2 backend (ACR and compatible registries)
//!
//! Discovery walks `/v2/_catalog` and filters client-side, since the catalog
//! has no server-side prefix filter. The most recent tag comes from ACR's
//! `/acr/v1/{repo}/_tags` extension.

use super::RegistryBackend;
use super::client::{PAGE_SIZE, RegistryClient, encode_repository_path};
use super::pagination::{CatalogBody, LinkPages, collect_pages};
use crate::config::BackendType;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct AcrTagList {
    #[serde(rename = "tagsAttributes", default)]
    tags_attributes: Option<Vec<AcrTag>>,
}

#[derive(Debug, Deserialize)]
struct AcrTag {
    name: String,
}

pub struct RegistryV2Backend {
    client: Arc<RegistryClient>,
}

impl RegistryV2Backend {
    pub fn new(client: Arc<RegistryClient>) -> Self {
        Self { client }
    }

    pub async fn list_catalog(&self) -> Result<Vec<String>> {
        let first = self.client.url(&format!("/v2/_catalog?n={}", PAGE_SIZE));
        let mut pages: LinkPages<'_, CatalogBody> =
            LinkPages::new(&self.client, first, "catalog listing".to_string());
        collect_pages(&mut pages).await
    }
}

/// `library` and `library/` both filter on `library/`; empty keeps everything
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.strip_suffix('/').unwrap_or(prefix);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[async_trait]
impl RegistryBackend for RegistryV2Backend {
    fn backend_type(&self) -> BackendType {
        BackendType::RegistryV2
    }

    async fn list_repositories(&self, prefix: &str) -> Result<BTreeSet<String>> {
        let prefix = normalize_prefix(prefix);
        let catalog = self.list_catalog().await?;

        self.client.output().verbose(&format!(
            "Catalog returned {} repositories, filtering on '{}'",
            catalog.len(),
            prefix
        ));

        Ok(catalog
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .collect())
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        self.client.list_tags(repository).await
    }

    async fn latest_tag(&self, repository: &str) -> Result<String> {
        let url = self.client.url(&format!(
            "/acr/v1/{}/_tags?orderby=timedesc&n=1",
            encode_repository_path(repository)
        ));

        let (body, _): (AcrTagList, _) = self
            .client
            .get_json(&url, &format!("ACR tag listing for {}", repository))
            .await?;

        body.tags_attributes
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|tag| tag.name)
            .ok_or_else(|| SyncError::NotFound(repository.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("library"), "library/");
        assert_eq!(normalize_prefix("library/"), "library/");
        assert_eq!(normalize_prefix("team/sub"), "team/sub/");
    }

    #[test]
    fn test_acr_tag_list_decoding() {
        let body: AcrTagList = serde_json::from_str(
            r#"{"registry":"r.azurecr.io","imageName":"app","tagsAttributes":[{"name":"v2","digest":"sha256:1"}]}"#,
        )
        .unwrap();
        assert_eq!(body.tags_attributes.unwrap()[0].name, "v2");
    }
}
