//! Boundary to the external image transport
//!
//! The byte-level copy (manifest-aware transfer plus forced recompression) is
//! not done in-process. [`ImageCopier`] is the seam the orchestrator calls;
//! [`SkopeoCopier`] drives the `skopeo` CLI.

pub mod skopeo;

pub use skopeo::SkopeoCopier;

use crate::config::AuthConfig;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Compression algorithm forced on every destination layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Zstd,
    ZstdChunked,
    Gzip,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Zstd => "zstd",
            Compression::ZstdChunked => "zstd:chunked",
            Compression::Gzip => "gzip",
        }
    }
}

impl FromStr for Compression {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zstd" => Ok(Compression::Zstd),
            "zstd:chunked" | "zstd-chunked" => Ok(Compression::ZstdChunked),
            "gzip" => Ok(Compression::Gzip),
            other => Err(SyncError::Configuration(format!(
                "unsupported compression: {} (expected zstd, zstd:chunked or gzip)",
                other
            ))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the transport needs for one image
#[derive(Debug, Clone)]
pub struct CopyRequest {
    /// `host/repository:tag` on the source registry
    pub source_ref: String,
    /// `host/repository:tag` on the destination registry
    pub destination_ref: String,
    pub source_auth: AuthConfig,
    pub destination_auth: AuthConfig,
    pub compression: Compression,
}

/// Performs the manifest-aware copy of a single image.
///
/// Implementations must stop all work when the returned future is dropped, so
/// the orchestrator's per-item timeout cancels the transfer.
#[async_trait]
pub trait ImageCopier: Send + Sync {
    async fn copy(&self, request: &CopyRequest) -> Result<()>;
}
