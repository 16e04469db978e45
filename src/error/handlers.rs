//! Standardized error construction for registry responses and configuration checks

use crate::error::{Result, SyncError};
use reqwest::Response;

/// Standard error handler for non-success HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Drain the response body for error reporting. A body that cannot be read
    /// must not hide the status code, so read failures become a placeholder.
    pub async fn read_error_body(response: Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string())
    }

    /// Build a listing error from a non-200 response
    pub async fn handle_list_error(response: Response, context: &str) -> SyncError {
        let status = response.status().as_u16();
        let body = Self::read_error_body(response).await;
        SyncError::List {
            context: context.to_string(),
            status,
            body: body.trim().to_string(),
        }
    }

    /// Build an existence-check error from a response that is neither 200 nor 404
    pub async fn handle_check_error(response: Response, reference: &str) -> SyncError {
        let status = response.status().as_u16();
        let body = Self::read_error_body(response).await;
        SyncError::Check {
            reference: reference.to_string(),
            status,
            body: body.trim().to_string(),
        }
    }

    pub fn parse_error(context: &str, err: &serde_json::Error) -> SyncError {
        SyncError::Parse {
            context: context.to_string(),
            message: err.to_string(),
        }
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> SyncError {
        if error.is_timeout() {
            SyncError::Network(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            SyncError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("dns") {
            SyncError::Network(format!("DNS resolution error for {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            SyncError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            SyncError::Network(format!("{} network error: {}", context, error))
        }
    }
}

/// Validation helpers shared by the configuration layer
pub struct ValidationErrorHandler;

impl ValidationErrorHandler {
    pub fn require(value: &Option<String>, name: &str) -> Result<String> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(SyncError::Configuration(format!(
                "missing required setting: {}",
                name
            ))),
        }
    }

    pub fn validate_registry_url(url: &str, name: &str) -> Result<()> {
        if url.is_empty() {
            return Err(SyncError::Configuration(format!("{} cannot be empty", name)));
        }

        if url.contains("://") && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SyncError::Configuration(format!(
                "Invalid {}: {}. Must use http:// or https://",
                name, url
            )));
        }

        Ok(())
    }

    pub fn validate_positive(value: u64, name: &str) -> Result<()> {
        if value == 0 {
            return Err(SyncError::Configuration(format!(
                "{} must be greater than 0",
                name
            )));
        }
        Ok(())
    }

    pub fn validate_timeout(timeout: u64) -> Result<()> {
        Self::validate_positive(timeout, "Copy timeout")?;

        if timeout > 86400 {
            // 24 hours
            return Err(SyncError::Configuration(
                "Copy timeout cannot exceed 24 hours (86400 seconds)".to_string(),
            ));
        }

        Ok(())
    }
}
