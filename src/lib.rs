//! Registry Syncer Library
//!
//! Mirrors container images from a Harbor or Registry v2 (ACR) source to a
//! destination registry, forcing layer recompression during transfer and
//! recording every synchronized (repository, tag) in a database ledger.

pub mod cli;
pub mod concurrency;
pub mod config;
pub mod copy;
pub mod error;
pub mod logging;
pub mod registry;
pub mod storage;
pub mod sync;

pub use config::{AppConfig, AuthConfig, BackendType, RegistryEndpoint};
pub use error::{Result, SyncError};
pub use logging::Logger;
