//! Destination manifest existence check

use super::client::{RegistryClient, encode_repository_path};
use crate::error::Result;
use crate::error::handlers::HttpErrorHandler;
use std::sync::Arc;

/// Docker v2 first; the list and OCI types let multi-arch indexes answer 200
pub const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
application/vnd.docker.distribution.manifest.list.v2+json, \
application/vnd.oci.image.manifest.v1+json, \
application/vnd.oci.image.index.v1+json";

#[derive(Clone)]
pub struct ExistenceChecker {
    client: Arc<RegistryClient>,
}

impl ExistenceChecker {
    pub fn new(client: Arc<RegistryClient>) -> Self {
        Self { client }
    }

    /// 200 means present and 404 means absent. Any other status is an error,
    /// never a guess in either direction.
    pub async fn exists(&self, repository: &str, tag: &str) -> Result<bool> {
        let url = self.client.url(&format!(
            "/v2/{}/manifests/{}",
            encode_repository_path(repository),
            urlencoding::encode(tag)
        ));

        let response = self.client.get(&url, MANIFEST_ACCEPT).await?;

        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => {
                let reference = format!("{}:{}", repository, tag);
                Err(HttpErrorHandler::handle_check_error(response, &reference).await)
            }
        }
    }
}
