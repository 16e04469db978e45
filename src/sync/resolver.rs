//! Path resolution
//!
//! Turns the caller's `[/]namespace[/repo][:tag]` into a set of source
//! repositories and a tag selector. The tag is split at the last colon, so a
//! registry host with a port is not mistaken for a tag separator inside the
//! repository part.

use crate::error::Result;
use crate::logging::Logger;
use crate::registry::RegistryBackend;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSelector {
    /// A single tag named by the caller
    Explicit(String),
    /// The most recently pushed tag of each repository
    LatestOnly,
    /// Every tag of each repository
    AllTags,
}

impl fmt::Display for TagSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSelector::Explicit(tag) => write!(f, "tag {}", tag),
            TagSelector::LatestOnly => write!(f, "latest tag"),
            TagSelector::AllTags => write!(f, "all tags"),
        }
    }
}

/// Caller input split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPath {
    /// Path with one leading `/` removed, without the tag
    pub path: String,
    pub tag: Option<String>,
}

impl InputPath {
    /// Listing prefix: empty for a registry-wide sweep, otherwise ending in `/`
    pub fn prefix(&self) -> String {
        if self.path.is_empty() || self.path.ends_with('/') {
            self.path.clone()
        } else {
            format!("{}/", self.path)
        }
    }

    /// The path taken literally as a repository name
    pub fn literal_repository(&self) -> String {
        self.path.trim_end_matches('/').to_string()
    }
}

pub fn parse_input_path(raw: &str) -> InputPath {
    let raw = raw.trim();
    let raw = raw.strip_prefix('/').unwrap_or(raw);

    match raw.rsplit_once(':') {
        Some((path, tag)) if !tag.is_empty() && !tag.contains('/') => InputPath {
            path: path.to_string(),
            tag: Some(tag.to_string()),
        },
        Some((path, "")) => InputPath {
            path: path.to_string(),
            tag: None,
        },
        _ => InputPath {
            path: raw.to_string(),
            tag: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub repositories: BTreeSet<String>,
    pub selector: TagSelector,
    /// The path named one repository rather than a namespace
    pub is_specific: bool,
}

pub struct PathResolver<'a> {
    backend: &'a dyn RegistryBackend,
    output: Logger,
}

impl<'a> PathResolver<'a> {
    pub fn new(backend: &'a dyn RegistryBackend, output: Logger) -> Self {
        Self { backend, output }
    }

    /// A listing failure is fatal for the whole run and is returned as-is.
    /// An explicit tag only chooses the selector; the repositories always come
    /// from the listing, or from the literal path when nothing is listed under it.
    pub async fn resolve(&self, raw: &str) -> Result<Resolution> {
        let input = parse_input_path(raw);

        let prefix = input.prefix();
        self.output.verbose(&format!(
            "Listing {} repositories under '{}'",
            self.backend.backend_type(),
            prefix
        ));
        let mut repositories = self.backend.list_repositories(&prefix).await?;

        let mut is_specific = false;
        if repositories.is_empty() && !input.path.is_empty() {
            let repository = input.literal_repository();
            self.output.verbose(&format!(
                "No repositories under '{}', treating {} as a single repository",
                prefix, repository
            ));
            repositories.insert(repository);
            is_specific = true;
        }

        let selector = match input.tag {
            Some(tag) => TagSelector::Explicit(tag),
            None if is_specific => TagSelector::AllTags,
            None => TagSelector::LatestOnly,
        };

        Ok(Resolution {
            repositories,
            selector,
            is_specific,
        })
    }
}
