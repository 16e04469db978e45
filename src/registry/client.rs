//! Low-level HTTP client shared by both registry backends
//!
//! Every request carries Basic auth and a per-request timeout. No request is
//! retried: a failed round trip surfaces as an error and the next full run is
//! the retry.

use crate::config::RegistryEndpoint;
use crate::error::handlers::HttpErrorHandler;
use crate::error::{Result, SyncError};
use crate::logging::Logger;
use crate::registry::pagination::{LinkPages, TagListBody, collect_pages};
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Per-request budget for every registry call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size requested from every paginated endpoint
pub const PAGE_SIZE: u32 = 100;

pub struct RegistryClientBuilder {
    endpoint: RegistryEndpoint,
    output: Option<Logger>,
}

impl RegistryClientBuilder {
    pub fn new(endpoint: RegistryEndpoint) -> Self {
        Self {
            endpoint,
            output: None,
        }
    }

    pub fn with_output(mut self, output: Logger) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        // Certificate verification is never relaxed for either registry
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(RegistryClient {
            client,
            endpoint: self.endpoint,
            output: self.output.unwrap_or_else(|| Logger::new(false)),
        })
    }
}

pub struct RegistryClient {
    client: Client,
    endpoint: RegistryEndpoint,
    output: Logger,
}

impl RegistryClient {
    pub fn new(endpoint: RegistryEndpoint, output: Logger) -> Result<Self> {
        Self::builder(endpoint).with_output(output).build()
    }

    pub fn builder(endpoint: RegistryEndpoint) -> RegistryClientBuilder {
        RegistryClientBuilder::new(endpoint)
    }

    pub fn endpoint(&self) -> &RegistryEndpoint {
        &self.endpoint
    }

    pub fn output(&self) -> &Logger {
        &self.output
    }

    /// Absolute URL for a path (and query) on this registry
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.endpoint.url_base, path_and_query)
    }

    /// Authenticated GET; status handling is left to the caller
    pub async fn get(&self, url: &str, accept: &str) -> Result<Response> {
        self.output.detail(&format!("GET {}", url));

        let response = self
            .client
            .get(url)
            .basic_auth(
                &self.endpoint.credentials.username,
                Some(&self.endpoint.credentials.password),
            )
            .header(ACCEPT, accept)
            .send()
            .await?;

        Ok(response)
    }

    /// GET a JSON document. Non-200 answers become [`SyncError::List`] and
    /// undecodable bodies [`SyncError::Parse`]. The raw `Link` header is handed
    /// back for cursor-based pagination.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<(T, Option<String>)> {
        let response = self.get(url, "application/json").await?;

        if response.status() != StatusCode::OK {
            return Err(HttpErrorHandler::handle_list_error(response, context).await);
        }

        let link = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?;
        let parsed = serde_json::from_slice(&body)
            .map_err(|e| HttpErrorHandler::parse_error(context, &e))?;

        Ok((parsed, link))
    }

    /// All tags of a repository through the Registry v2 `tags/list` endpoint.
    /// Harbor serves the same Docker-compatible endpoint, so both backends use it.
    pub async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let first = self.url(&format!(
            "/v2/{}/tags/list?n={}",
            encode_repository_path(repository),
            PAGE_SIZE
        ));
        let mut pages: LinkPages<'_, TagListBody> =
            LinkPages::new(self, first, format!("tags of {}", repository));
        let tags = collect_pages(&mut pages).await?;

        self.output.verbose(&format!(
            "Found {} tags for repository {}",
            tags.len(),
            repository
        ));
        Ok(tags)
    }
}

/// Percent-encode each segment of a repository path while keeping the `/`
/// separators the Registry v2 routes expect.
pub fn encode_repository_path(repository: &str) -> String {
    repository
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
