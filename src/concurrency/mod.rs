//! Bounded fan-out for registry discovery and image synchronization
//!
//! Two independent pools share the same mechanics: a `tokio::sync::Semaphore`
//! caps how many futures run at once while `join_all` / `try_join_all` drive
//! them to completion.
//!
//! - [`BoundedExecutor::run_all`] never stops early; every item yields its own
//!   result. Used for sync work items where one failure must not halt others.
//! - [`BoundedExecutor::try_run_all`] aborts on the first error and drops the
//!   futures still in flight. Used for Harbor project fan-out, where a single
//!   failing project fails the whole listing.

use crate::error::handlers::ValidationErrorHandler;
use crate::error::{Result, SyncError};
use futures::future::{join_all, try_join_all};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Worker limits for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    /// Work items (existence check, copy, record) in flight
    pub sync: usize,
    /// Harbor projects listed in parallel during a registry-wide sweep
    pub discovery: usize,
}

impl ConcurrencyLimits {
    pub fn new(sync: usize, discovery: usize) -> Result<Self> {
        ValidationErrorHandler::validate_positive(sync as u64, "Sync concurrency")?;
        ValidationErrorHandler::validate_positive(discovery as u64, "Discovery concurrency")?;
        Ok(Self { sync, discovery })
    }
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            sync: 4,
            discovery: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl BoundedExecutor {
    /// A zero limit is raised to one
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `task` over every item and return the results in input order
    pub async fn run_all<I, T, F, Fut>(&self, items: I, task: F) -> Vec<Result<T>>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let futures = items.into_iter().map(|item| {
            let semaphore = Arc::clone(&self.semaphore);
            let fut = task(item);
            async move {
                let _permit = semaphore.acquire().await.map_err(|e| {
                    SyncError::Configuration(format!("Failed to acquire worker permit: {}", e))
                })?;
                fut.await
            }
        });

        join_all(futures).await
    }

    /// Like [`run_all`](Self::run_all) but stops at the first error
    pub async fn try_run_all<I, T, F, Fut>(&self, items: I, task: F) -> Result<Vec<T>>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let futures = items.into_iter().map(|item| {
            let semaphore = Arc::clone(&self.semaphore);
            let fut = task(item);
            async move {
                let _permit = semaphore.acquire().await.map_err(|e| {
                    SyncError::Configuration(format!("Failed to acquire worker permit: {}", e))
                })?;
                fut.await
            }
        });

        try_join_all(futures).await
    }
}
