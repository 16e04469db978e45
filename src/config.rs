//! Configuration module for registry endpoints, the sync ledger database and run settings

use crate::cli::Args;
use crate::concurrency::ConcurrencyLimits;
use crate::copy::Compression;
use crate::error::handlers::ValidationErrorHandler;
use crate::error::{Result, SyncError};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which registry API flavor an endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Harbor's proprietary `/api/v2.0` REST API
    Harbor,
    /// Docker Registry v2 `_catalog` API, with ACR's `_tags` extension for "latest"
    RegistryV2,
}

impl FromStr for BackendType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "harbor" => Ok(BackendType::Harbor),
            "acr" | "registry" | "v2" => Ok(BackendType::RegistryV2),
            other => Err(SyncError::Configuration(format!(
                "unsupported registry type: {} (expected harbor or acr)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::Harbor => write!(f, "harbor"),
            BackendType::RegistryV2 => write!(f, "acr"),
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl AuthConfig {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// One registry side of the mirror. Immutable for the whole run.
#[derive(Debug, Clone)]
pub struct RegistryEndpoint {
    /// Base URL with scheme and without trailing slash
    pub url_base: String,
    pub credentials: AuthConfig,
    pub backend: BackendType,
}

impl RegistryEndpoint {
    pub fn new(url_base: &str, credentials: AuthConfig, backend: BackendType) -> Self {
        Self {
            url_base: normalize_url_base(url_base),
            credentials,
            backend,
        }
    }

    /// Registry host (and port) as used in image references
    pub fn host(&self) -> &str {
        self.url_base
            .trim_start_matches("https://")
            .trim_start_matches("http://")
    }

    /// `host/repository:tag` reference understood by the image transport
    pub fn image_reference(&self, repository: &str, tag: &str) -> String {
        format!("{}/{}:{}", self.host(), repository, tag)
    }
}

/// Trim whitespace and trailing slashes, defaulting to `https://` when no scheme is given
pub fn normalize_url_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Drop and recreate the ledger table before the run
    pub reset: bool,
}

impl DatabaseConfig {
    /// Assemble a Postgres URL from discrete connection settings
    pub fn postgres_url(host: &str, port: u16, user: &str, password: &str, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(user),
            urlencoding::encode(password),
            host,
            port,
            database
        )
    }
}

/// Knobs for the synchronization run itself
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub sync_concurrency: usize,
    pub discovery_concurrency: usize,
    pub copy_timeout: Duration,
    pub compression: Compression,
    pub skopeo_path: String,
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_concurrency: 4,
            discovery_concurrency: 4,
            copy_timeout: Duration::from_secs(15 * 60),
            compression: Compression::Zstd,
            skopeo_path: "skopeo".to_string(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: RegistryEndpoint,
    pub destination: RegistryEndpoint,
    pub database: DatabaseConfig,
    pub sync: SyncSettings,
    /// Caller-supplied path, `[/]namespace[/repo][:tag]`; empty means registry-wide
    pub path: String,
}

impl AppConfig {
    /// Validate parsed arguments and turn them into a run configuration
    pub fn from_args(args: &Args) -> Result<Self> {
        let source = Self::endpoint(
            &args.src_urlbase,
            &args.src_user,
            &args.src_password,
            &args.src_type,
            "SRC",
        )?;
        let destination = Self::endpoint(
            &args.dst_urlbase,
            &args.dst_user,
            &args.dst_password,
            &args.dst_type,
            "DST",
        )?;

        let url = match args.database_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => {
                let host = ValidationErrorHandler::require(&args.db_host, "DB_HOST")?;
                let port = ValidationErrorHandler::require(&args.db_port, "DB_PORT")?;
                let port: u16 = port.parse().map_err(|e| {
                    SyncError::Configuration(format!("invalid integer for DB_PORT: {}", e))
                })?;
                let user = ValidationErrorHandler::require(&args.db_user, "DB_USER")?;
                let password = ValidationErrorHandler::require(&args.db_password, "DB_PASSWORD")?;
                let name = ValidationErrorHandler::require(&args.db_name, "DB_NAME")?;
                DatabaseConfig::postgres_url(&host, port, &user, &password, &name)
            }
        };

        let limits = ConcurrencyLimits::new(args.sync_concurrency, args.discovery_concurrency)?;
        ValidationErrorHandler::validate_timeout(args.copy_timeout)?;

        Ok(AppConfig {
            source,
            destination,
            database: DatabaseConfig {
                url,
                max_connections: limits.sync as u32 + 1,
                reset: args.reset_records,
            },
            sync: SyncSettings {
                sync_concurrency: limits.sync,
                discovery_concurrency: limits.discovery,
                copy_timeout: Duration::from_secs(args.copy_timeout),
                compression: args.compression.parse()?,
                skopeo_path: args.skopeo_path.clone(),
                dry_run: args.dry_run,
            },
            path: args.path.clone().unwrap_or_default(),
        })
    }

    fn endpoint(
        url: &Option<String>,
        user: &Option<String>,
        password: &Option<String>,
        backend: &Option<String>,
        side: &str,
    ) -> Result<RegistryEndpoint> {
        let url_name = format!("{}_URLBASE", side);
        let url = ValidationErrorHandler::require(url, &url_name)?;
        ValidationErrorHandler::validate_registry_url(&url, &url_name)?;

        let user = ValidationErrorHandler::require(user, &format!("{}_USER", side))?;
        let password = ValidationErrorHandler::require(password, &format!("{}_PASSWORD", side))?;
        let backend: BackendType =
            ValidationErrorHandler::require(backend, &format!("{}_TYPE", side))?.parse()?;

        Ok(RegistryEndpoint::new(
            &url,
            AuthConfig::new(user, password),
            backend,
        ))
    }
}
