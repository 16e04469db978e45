//! Error types for registry discovery, synchronization and persistence

pub mod handlers;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A listing endpoint answered with something other than 200
    #[error("{context} failed (status {status}): {body}")]
    List {
        context: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected schema
    #[error("Failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    /// Harbor needs a `project/repository` path for artifact queries
    #[error("Invalid repository path: must be project/repository, got {0}")]
    InvalidPath(String),

    #[error("No tags found for {0}")]
    NotFound(String),

    /// The destination manifest check answered with neither 200 nor 404
    #[error("Existence check for {reference} failed (status {status}): {body}")]
    Check {
        reference: String,
        status: u16,
        body: String,
    },

    #[error("Copy {source_ref} -> {destination_ref} failed: {message}")]
    Copy {
        source_ref: String,
        destination_ref: String,
        message: String,
    },

    #[error("Copy {source_ref} -> {destination_ref} timed out after {seconds}s")]
    CopyTimeout {
        source_ref: String,
        destination_ref: String,
        seconds: u64,
    },

    #[error("Store error: {0}")]
    Store(#[from] sea_orm::DbErr),

    /// Transport-level failure of a single HTTP round trip
    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        handlers::NetworkErrorHandler::handle_network_error(&err, "registry request")
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::Configuration(format!("Invalid URL: {}", err))
    }
}

impl SyncError {
    /// Short label for the failure class, used in run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::List { .. } => "list",
            SyncError::Parse { .. } => "parse",
            SyncError::InvalidPath(_) => "invalid-path",
            SyncError::NotFound(_) => "not-found",
            SyncError::Check { .. } => "check",
            SyncError::Copy { .. } | SyncError::CopyTimeout { .. } => "copy",
            SyncError::Store(_) => "store",
            SyncError::Network(_) => "network",
            SyncError::Configuration(_) => "configuration",
        }
    }
}
