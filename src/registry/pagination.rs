//! Lazy page producers for the two cursor styles
//!
//! Harbor counts pages (`page=1,2,…`) and signals the end with an empty page.
//! Registry v2 hands out an opaque next URL in the `Link` header and signals
//! the end by omitting `rel="next"`. Both are exposed through [`PageSource`];
//! every listing call builds a fresh producer.

use crate::error::Result;
use crate::registry::client::RegistryClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Producer of successive pages of names. `None` means the listing is exhausted.
#[async_trait]
pub trait PageSource: Send {
    async fn next_page(&mut self) -> Result<Option<Vec<String>>>;
}

/// Drain a page source into a single vector, preserving page order
pub async fn collect_pages<S: PageSource + ?Sized>(source: &mut S) -> Result<Vec<String>> {
    let mut items = Vec::new();
    while let Some(page) = source.next_page().await? {
        items.extend(page);
    }
    Ok(items)
}

/// Harbor list entry: projects and repositories both carry a `name`
#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

/// Page-number cursor for Harbor's `page`/`page_size` listings
pub struct PageNumberPages<'a> {
    client: &'a RegistryClient,
    path: String,
    context: String,
    page: u32,
    page_size: u32,
    exhausted: bool,
}

impl<'a> PageNumberPages<'a> {
    /// `path` is the endpoint path without query, e.g. `/api/v2.0/projects`
    pub fn new(client: &'a RegistryClient, path: String, context: String, page_size: u32) -> Self {
        Self {
            client,
            path,
            context,
            page: 1,
            page_size,
            exhausted: false,
        }
    }
}

#[async_trait]
impl PageSource for PageNumberPages<'_> {
    async fn next_page(&mut self) -> Result<Option<Vec<String>>> {
        if self.exhausted {
            return Ok(None);
        }

        let url = self.client.url(&format!(
            "{}?page={}&page_size={}",
            self.path, self.page, self.page_size
        ));
        let (entries, _): (Vec<NamedEntry>, _) = self.client.get_json(&url, &self.context).await?;

        // A short page is not the end; only an empty one is
        if entries.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.page += 1;
        Ok(Some(entries.into_iter().map(|e| e.name).collect()))
    }
}

/// Body shapes that carry a list of names on a `Link`-paginated endpoint
pub trait NameListing: DeserializeOwned {
    fn into_names(self) -> Vec<String>;
}

/// `GET /v2/_catalog`
#[derive(Debug, Deserialize)]
pub struct CatalogBody {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

impl NameListing for CatalogBody {
    fn into_names(self) -> Vec<String> {
        self.repositories.unwrap_or_default()
    }
}

/// `GET /v2/{name}/tags/list`; registries answer `"tags": null` for untagged repositories
#[derive(Debug, Deserialize)]
pub struct TagListBody {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl NameListing for TagListBody {
    fn into_names(self) -> Vec<String> {
        self.tags.unwrap_or_default()
    }
}

/// `Link`-header cursor for Registry v2 listings
pub struct LinkPages<'a, B> {
    client: &'a RegistryClient,
    next: Option<String>,
    context: String,
    _body: PhantomData<fn() -> B>,
}

impl<'a, B> LinkPages<'a, B> {
    pub fn new(client: &'a RegistryClient, first_url: String, context: String) -> Self {
        Self {
            client,
            next: Some(first_url),
            context,
            _body: PhantomData,
        }
    }
}

#[async_trait]
impl<B: NameListing> PageSource for LinkPages<'_, B> {
    async fn next_page(&mut self) -> Result<Option<Vec<String>>> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        let (body, link): (B, _) = self.client.get_json(&url, &self.context).await?;

        self.next = match link.as_deref().and_then(parse_next_link) {
            Some(target) => Some(resolve_link(&url, &target)?),
            None => None,
        };

        Ok(Some(body.into_names()))
    }
}

/// Extract the target of the `rel="next"` entry of a `Link` header
pub fn parse_next_link(header: &str) -> Option<String> {
    header
        .split(',')
        .find(|entry| entry.contains("rel=\"next\"") || entry.contains("rel=next"))
        .and_then(|entry| {
            let start = entry.find('<')?;
            let end = entry[start..].find('>')? + start;
            Some(entry[start + 1..end].trim().to_string())
        })
        .filter(|target| !target.is_empty())
}

/// Registries usually send a path-only next link; absolute links are used verbatim
pub fn resolve_link(current_url: &str, target: &str) -> Result<String> {
    let base = url::Url::parse(current_url)?;
    Ok(base.join(target)?.to_string())
}
