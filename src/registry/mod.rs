//! Registry discovery and probing
//!
//! A [`RegistryBackend`] answers three questions about a source registry:
//! which repositories live under a prefix, which tags a repository has, and
//! which tag was pushed most recently. Two implementations exist:
//!
//! - [`HarborBackend`] uses Harbor's `/api/v2.0` project and artifact API.
//! - [`RegistryV2Backend`] uses the Docker Registry v2 catalog, with ACR's
//!   `_tags` extension for the most recent tag.
//!
//! [`ExistenceChecker`] checks the destination for a manifest and is
//! independent of the backend flavor.

pub mod client;
pub mod existence;
pub mod harbor;
pub mod pagination;
pub mod registry_v2;

pub use client::{RegistryClient, RegistryClientBuilder};
pub use existence::ExistenceChecker;
pub use harbor::HarborBackend;
pub use registry_v2::RegistryV2Backend;

use crate::config::BackendType;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

#[async_trait]
pub trait RegistryBackend: Send + Sync {
    fn backend_type(&self) -> BackendType;

    /// Repository paths under `prefix`; an empty prefix lists the whole registry
    async fn list_repositories(&self, prefix: &str) -> Result<BTreeSet<String>>;

    /// Every tag of `repository`, following pagination to the end
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Most recently pushed tag of `repository`
    async fn latest_tag(&self, repository: &str) -> Result<String>;
}

/// Pick the backend implementation for the client's endpoint
pub fn create_backend(
    client: Arc<RegistryClient>,
    discovery_concurrency: usize,
) -> Arc<dyn RegistryBackend> {
    match client.endpoint().backend {
        BackendType::Harbor => Arc::new(HarborBackend::new(client, discovery_concurrency)),
        BackendType::RegistryV2 => Arc::new(RegistryV2Backend::new(client)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, RegistryEndpoint};
    use crate::logging::Logger;

    fn client(backend: BackendType) -> Arc<RegistryClient> {
        let endpoint = RegistryEndpoint::new(
            "https://registry.local",
            AuthConfig::new("u".into(), "p".into()),
            backend,
        );
        Arc::new(RegistryClient::new(endpoint, Logger::new_quiet()).unwrap())
    }

    #[test]
    fn test_create_backend_follows_endpoint_type() {
        assert_eq!(
            create_backend(client(BackendType::Harbor), 4).backend_type(),
            BackendType::Harbor
        );
        assert_eq!(
            create_backend(client(BackendType::RegistryV2), 4).backend_type(),
            BackendType::RegistryV2
        );
    }
}
