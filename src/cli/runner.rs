//! Runner wiring configuration, registries, ledger and orchestrator together

use crate::config::AppConfig;
use crate::copy::{ImageCopier, SkopeoCopier};
use crate::error::Result;
use crate::logging::Logger;
use crate::registry::{ExistenceChecker, RegistryClient, create_backend};
use crate::storage::RecordStore;
use crate::sync::{PathResolver, SyncOrchestrator, SyncReport};
use std::sync::Arc;

pub struct Runner {
    config: AppConfig,
    output: Logger,
}

impl Runner {
    pub fn new(config: AppConfig, output: Logger) -> Self {
        Self { config, output }
    }

    /// Resolve, synchronize and report. Only start-up and discovery failures
    /// are returned as errors; per-item failures end up in the report.
    pub async fn run(&self) -> Result<SyncReport> {
        self.output.section("Registry Syncer");
        self.output.info(&format!(
            "Source: {} ({}), destination: {} ({})",
            self.config.source.url_base,
            self.config.source.backend,
            self.config.destination.url_base,
            self.config.destination.backend
        ));
        if self.config.sync.dry_run {
            self.output.warning("Dry run: nothing will be copied or recorded");
        }

        let store = RecordStore::connect(&self.config.database.url, self.config.database.max_connections).await?;
        store.init_schema(self.config.database.reset).await?;
        if self.config.database.reset {
            self.output.warning("Sync ledger table was reset");
        }

        let source_client = Arc::new(RegistryClient::new(
            self.config.source.clone(),
            self.output.clone(),
        )?);
        let destination_client = Arc::new(RegistryClient::new(
            self.config.destination.clone(),
            self.output.clone(),
        )?);

        let source = create_backend(source_client, self.config.sync.discovery_concurrency);
        let copier: Arc<dyn ImageCopier> = Arc::new(SkopeoCopier::new(
            self.config.sync.skopeo_path.clone(),
            self.output.clone(),
        ));

        let display_path = if self.config.path.is_empty() {
            "(entire registry)"
        } else {
            self.config.path.as_str()
        };
        self.output.step(&format!("Resolving {}", display_path));
        let resolution = PathResolver::new(source.as_ref(), self.output.clone())
            .resolve(&self.config.path)
            .await?;

        let orchestrator = SyncOrchestrator::builder(self.output.clone())
            .with_source(source, self.config.source.clone())
            .with_destination(
                ExistenceChecker::new(destination_client),
                self.config.destination.clone(),
            )
            .with_copier(copier)
            .with_store(store)
            .with_settings(self.config.sync.clone())
            .build()?;

        let report = orchestrator.run(&resolution).await;
        self.print_summary(&report);
        Ok(report)
    }

    pub fn print_summary(&self, report: &SyncReport) {
        let mut rows = vec![
            ("Work items", report.items.len().to_string()),
            ("Already present", report.already_present().to_string()),
            ("Copied", report.synced().to_string()),
        ];
        if self.config.sync.dry_run {
            rows.push(("Would copy", report.would_sync().to_string()));
        }
        rows.push(("Failed", report.failed().to_string()));
        rows.push(("Repositories skipped", report.skipped.len().to_string()));
        rows.push(("Elapsed", self.output.format_duration(self.output.elapsed())));

        self.output.summary_kv("Sync Summary", &rows);

        if !report.skipped.is_empty() {
            let skipped: Vec<String> = report
                .skipped
                .iter()
                .map(|skip| format!("{}: {}", skip.repository, skip.error))
                .collect();
            self.output.list("Skipped repositories", &skipped);
        }

        let failures: Vec<String> = report
            .failures()
            .map(|(item, stage, error)| format!("{} [{}/{}] {}", item, stage, error.kind(), error))
            .collect();
        if !failures.is_empty() {
            self.output.list("Failed items", &failures);
        }

        if report.is_clean() {
            self.output.success("Sync completed");
        } else {
            self.output.warning("Sync completed with failures; rerun to retry them");
        }
    }
}
