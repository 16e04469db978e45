//! Command-line argument parsing
//!
//! Every connection setting can be given as a flag or through the environment
//! variable named next to it. Required values are checked by
//! [`AppConfig::from_args`](crate::config::AppConfig::from_args) so the error
//! names the variable the operator is expected to set.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "registry-syncer")]
#[command(about = "Mirror images between Harbor and ACR/Registry v2 registries with forced recompression")]
#[command(version, author)]
pub struct Args {
    /// Path to sync: `[/]namespace[/repo][:tag]`; empty syncs the whole registry
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    #[arg(long = "src-url", env = "SRC_URLBASE", help = "Source registry base URL")]
    pub src_urlbase: Option<String>,

    #[arg(long = "src-user", env = "SRC_USER", help = "Source registry username")]
    pub src_user: Option<String>,

    #[arg(
        long = "src-password",
        env = "SRC_PASSWORD",
        hide_env_values = true,
        help = "Source registry password"
    )]
    pub src_password: Option<String>,

    #[arg(long = "src-type", env = "SRC_TYPE", help = "Source registry type: harbor or acr")]
    pub src_type: Option<String>,

    #[arg(long = "dst-url", env = "DST_URLBASE", help = "Destination registry base URL")]
    pub dst_urlbase: Option<String>,

    #[arg(long = "dst-user", env = "DST_USER", help = "Destination registry username")]
    pub dst_user: Option<String>,

    #[arg(
        long = "dst-password",
        env = "DST_PASSWORD",
        hide_env_values = true,
        help = "Destination registry password"
    )]
    pub dst_password: Option<String>,

    #[arg(long = "dst-type", env = "DST_TYPE", help = "Destination registry type: harbor or acr")]
    pub dst_type: Option<String>,

    #[arg(
        long = "database-url",
        env = "DATABASE_URL",
        hide_env_values = true,
        help = "Full database URL; overrides the DB_* settings"
    )]
    pub database_url: Option<String>,

    #[arg(long = "db-host", env = "DB_HOST")]
    pub db_host: Option<String>,

    #[arg(long = "db-port", env = "DB_PORT")]
    pub db_port: Option<String>,

    #[arg(long = "db-user", env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long = "db-password", env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long = "db-name", env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Number of work items copied concurrently
    #[arg(
        long = "sync-concurrency",
        short = 'j',
        default_value = "4",
        help = "Number of concurrent sync workers"
    )]
    pub sync_concurrency: usize,

    /// Number of Harbor projects listed concurrently during a registry-wide sweep
    #[arg(long = "discovery-concurrency", default_value = "4")]
    pub discovery_concurrency: usize,

    /// Upper bound for a single image copy, independent of image size
    #[arg(
        long = "copy-timeout",
        short = 't',
        default_value = "900",
        help = "Timeout for a single image copy in seconds"
    )]
    pub copy_timeout: u64,

    #[arg(
        long = "compression",
        default_value = "zstd",
        help = "Target layer compression: zstd, zstd:chunked or gzip"
    )]
    pub compression: String,

    #[arg(long = "skopeo-path", default_value = "skopeo", env = "SKOPEO_PATH")]
    pub skopeo_path: String,

    /// Check the destination but copy and record nothing
    #[arg(long = "dry-run", short = 'n')]
    pub dry_run: bool,

    /// Drop and recreate the sync ledger table before running
    #[arg(long = "reset-records")]
    pub reset_records: bool,

    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long = "quiet", short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }
}
