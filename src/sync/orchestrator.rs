//! Per-item skip/copy/record decisions
//!
//! The orchestrator expands a [`Resolution`] into work items, then runs each
//! item through existence check, copy and record on a bounded worker pool.
//! A failing item never stops the others; a failing tag lookup skips only its
//! repository.

use super::resolver::{Resolution, TagSelector};
use crate::concurrency::BoundedExecutor;
use crate::config::{RegistryEndpoint, SyncSettings};
use crate::copy::{CopyRequest, ImageCopier};
use crate::error::{Result, SyncError};
use crate::logging::Logger;
use crate::registry::{ExistenceChecker, RegistryBackend};
use crate::storage::RecordStore;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkItem {
    pub repository: String,
    pub tag: String,
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Check,
    Copy,
    Store,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Check => write!(f, "check"),
            FailureStage::Copy => write!(f, "copy"),
            FailureStage::Store => write!(f, "store"),
        }
    }
}

#[derive(Debug)]
pub enum ItemOutcome {
    /// Destination already had the tag; the record was refreshed
    AlreadyPresent,
    /// Copied and recorded
    Synced,
    /// Missing on the destination, left alone because of a dry run
    WouldSync,
    Failed {
        stage: FailureStage,
        error: SyncError,
    },
}

#[derive(Debug)]
pub struct ItemResult {
    pub item: WorkItem,
    pub outcome: ItemOutcome,
}

/// A repository dropped before any work item was produced for it
#[derive(Debug)]
pub struct RepositorySkip {
    pub repository: String,
    pub error: SyncError,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub items: Vec<ItemResult>,
    pub skipped: Vec<RepositorySkip>,
}

impl SyncReport {
    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|r| predicate(&r.outcome)).count()
    }

    pub fn already_present(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::AlreadyPresent))
    }

    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Synced))
    }

    pub fn would_sync(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::WouldSync))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&WorkItem, FailureStage, &SyncError)> {
        self.items.iter().filter_map(|r| match &r.outcome {
            ItemOutcome::Failed { stage, error } => Some((&r.item, *stage, error)),
            _ => None,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.skipped.is_empty()
    }
}

pub struct SyncOrchestratorBuilder {
    source: Option<(Arc<dyn RegistryBackend>, RegistryEndpoint)>,
    destination: Option<(ExistenceChecker, RegistryEndpoint)>,
    copier: Option<Arc<dyn ImageCopier>>,
    store: Option<RecordStore>,
    settings: SyncSettings,
    output: Logger,
}

impl SyncOrchestratorBuilder {
    pub fn new(output: Logger) -> Self {
        Self {
            source: None,
            destination: None,
            copier: None,
            store: None,
            settings: SyncSettings::default(),
            output,
        }
    }

    pub fn with_source(mut self, backend: Arc<dyn RegistryBackend>, endpoint: RegistryEndpoint) -> Self {
        self.source = Some((backend, endpoint));
        self
    }

    pub fn with_destination(mut self, checker: ExistenceChecker, endpoint: RegistryEndpoint) -> Self {
        self.destination = Some((checker, endpoint));
        self
    }

    pub fn with_copier(mut self, copier: Arc<dyn ImageCopier>) -> Self {
        self.copier = Some(copier);
        self
    }

    pub fn with_store(mut self, store: RecordStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<SyncOrchestrator> {
        let missing = |what: &str| SyncError::Configuration(format!("orchestrator needs a {}", what));

        let (source, source_endpoint) = self.source.ok_or_else(|| missing("source"))?;
        let (checker, destination_endpoint) = self.destination.ok_or_else(|| missing("destination"))?;

        Ok(SyncOrchestrator {
            source,
            source_endpoint,
            checker,
            destination_endpoint,
            copier: self.copier.ok_or_else(|| missing("copier"))?,
            store: self.store.ok_or_else(|| missing("record store"))?,
            workers: BoundedExecutor::new(self.settings.sync_concurrency),
            lookups: BoundedExecutor::new(self.settings.discovery_concurrency),
            settings: self.settings,
            output: self.output,
        })
    }
}

pub struct SyncOrchestrator {
    source: Arc<dyn RegistryBackend>,
    source_endpoint: RegistryEndpoint,
    checker: ExistenceChecker,
    destination_endpoint: RegistryEndpoint,
    copier: Arc<dyn ImageCopier>,
    store: RecordStore,
    workers: BoundedExecutor,
    lookups: BoundedExecutor,
    settings: SyncSettings,
    output: Logger,
}

impl SyncOrchestrator {
    pub fn builder(output: Logger) -> SyncOrchestratorBuilder {
        SyncOrchestratorBuilder::new(output)
    }

    pub async fn run(&self, resolution: &Resolution) -> SyncReport {
        let (items, skipped) = self.plan(resolution).await;

        self.output.info(&format!(
            "{} work items across {} repositories ({})",
            items.len(),
            resolution.repositories.len(),
            resolution.selector
        ));

        let results = self
            .workers
            .run_all(items, |item| async move {
                let outcome = self.process(&item).await;
                Ok(ItemResult { item, outcome })
            })
            .await;

        let mut report = SyncReport {
            items: Vec::with_capacity(results.len()),
            skipped,
        };
        for result in results {
            match result {
                Ok(item) => report.items.push(item),
                Err(e) => self.output.error(&format!("Worker failed: {}", e)),
            }
        }
        report
    }

    /// Expand repositories into unique work items, collecting per-repository skips
    pub async fn plan(&self, resolution: &Resolution) -> (BTreeSet<WorkItem>, Vec<RepositorySkip>) {
        let lookups = self
            .lookups
            .run_all(resolution.repositories.iter().cloned(), |repository| async move {
                let tags = self.tags_for(&repository, &resolution.selector).await;
                Ok((repository, tags))
            })
            .await;

        let mut items = BTreeSet::new();
        let mut skipped = Vec::new();

        for lookup in lookups {
            match lookup {
                Ok((repository, Ok(tags))) => {
                    if tags.is_empty() {
                        self.output.verbose(&format!("{} has no tags", repository));
                    }
                    items.extend(tags.into_iter().map(|tag| WorkItem {
                        repository: repository.clone(),
                        tag,
                    }));
                }
                Ok((repository, Err(error))) => {
                    self.output.warning(&format!("Skipping {}: {}", repository, error));
                    skipped.push(RepositorySkip { repository, error });
                }
                Err(e) => self.output.error(&format!("Tag lookup failed: {}", e)),
            }
        }

        (items, skipped)
    }

    async fn tags_for(&self, repository: &str, selector: &TagSelector) -> Result<Vec<String>> {
        match selector {
            TagSelector::Explicit(tag) => Ok(vec![tag.clone()]),
            TagSelector::AllTags => self.source.list_tags(repository).await,
            TagSelector::LatestOnly => Ok(vec![self.source.latest_tag(repository).await?]),
        }
    }

    /// Existence check, then copy when missing, then record
    pub async fn process(&self, item: &WorkItem) -> ItemOutcome {
        let source_ref = self.source_endpoint.image_reference(&item.repository, &item.tag);
        let destination_ref = self.destination_endpoint.image_reference(&item.repository, &item.tag);

        let present = match self.checker.exists(&item.repository, &item.tag).await {
            Ok(present) => present,
            Err(error) => return self.fail(item, FailureStage::Check, error),
        };

        if self.settings.dry_run {
            return if present {
                self.output.verbose(&format!("{} already present", item));
                ItemOutcome::AlreadyPresent
            } else {
                self.output.info(&format!("Would copy {} -> {}", source_ref, destination_ref));
                ItemOutcome::WouldSync
            };
        }

        if present {
            self.output.verbose(&format!("{} already present on destination", item));
        } else {
            self.output.step(&format!("Copying {} -> {}", source_ref, destination_ref));
            if let Err(error) = self.copy(&source_ref, &destination_ref).await {
                return self.fail(item, FailureStage::Copy, error);
            }
        }

        if let Err(error) = self
            .store
            .upsert(&item.repository, &item.tag, &source_ref, &destination_ref)
            .await
        {
            return self.fail(item, FailureStage::Store, error);
        }

        if present {
            ItemOutcome::AlreadyPresent
        } else {
            self.output.success(&format!("Synced {}", item));
            ItemOutcome::Synced
        }
    }

    async fn copy(&self, source_ref: &str, destination_ref: &str) -> Result<()> {
        let request = CopyRequest {
            source_ref: source_ref.to_string(),
            destination_ref: destination_ref.to_string(),
            source_auth: self.source_endpoint.credentials.clone(),
            destination_auth: self.destination_endpoint.credentials.clone(),
            compression: self.settings.compression,
        };

        // Dropping the copy future on timeout kills the transport process
        match tokio::time::timeout(self.settings.copy_timeout, self.copier.copy(&request)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::CopyTimeout {
                source_ref: request.source_ref,
                destination_ref: request.destination_ref,
                seconds: self.settings.copy_timeout.as_secs(),
            }),
        }
    }

    fn fail(&self, item: &WorkItem, stage: FailureStage, error: SyncError) -> ItemOutcome {
        self.output.error(&format!("{} failed at {}: {}", item, stage, error));
        ItemOutcome::Failed { stage, error }
    }
}
