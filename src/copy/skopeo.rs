//! `skopeo copy` driver
//!
//! skopeo is the command-line front end of the containers/image transport. It
//! handles manifest lists, blob reuse and recompression; this module only
//! assembles the invocation and interprets the exit status.

use super::{CopyRequest, ImageCopier};
use crate::config::AuthConfig;
use crate::error::{Result, SyncError};
use crate::logging::Logger;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;

/// Longest stderr excerpt carried into a copy error
const STDERR_EXCERPT: usize = 2048;

pub struct SkopeoCopier {
    binary: String,
    output: Logger,
}

impl SkopeoCopier {
    pub fn new(binary: impl Into<String>, output: Logger) -> Self {
        Self {
            binary: binary.into(),
            output,
        }
    }

    /// Arguments for one copy. TLS verification stays on for both sides and
    /// the destination compression is forced rather than negotiated.
    /// Credentials only travel through the two auth files.
    pub fn build_args(request: &CopyRequest, src_authfile: &Path, dest_authfile: &Path) -> Vec<String> {
        vec![
            "copy".to_string(),
            "--multi-arch".to_string(),
            "all".to_string(),
            "--src-tls-verify=true".to_string(),
            "--dest-tls-verify=true".to_string(),
            "--dest-compress-format".to_string(),
            request.compression.as_str().to_string(),
            "--dest-force-compress-format".to_string(),
            "--src-authfile".to_string(),
            src_authfile.display().to_string(),
            "--dest-authfile".to_string(),
            dest_authfile.display().to_string(),
            format!("docker://{}", request.source_ref),
            format!("docker://{}", request.destination_ref),
        ]
    }

    /// containers-auth.json document holding one registry's Basic credentials
    pub fn auth_file_contents(reference: &str, auth: &AuthConfig) -> String {
        let host = registry_host(reference);
        let encoded = BASE64.encode(format!("{}:{}", auth.username, auth.password));
        serde_json::json!({
            "auths": { host: { "auth": encoded } }
        })
        .to_string()
    }

    /// Removed from disk when the returned handle drops. tempfile creates it
    /// readable by the owner only.
    fn write_auth_file(request: &CopyRequest, reference: &str, auth: &AuthConfig) -> Result<NamedTempFile> {
        let write = || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("registry-syncer-auth-")
                .suffix(".json")
                .tempfile()?;
            file.write_all(Self::auth_file_contents(reference, auth).as_bytes())?;
            file.flush()?;
            Ok(file)
        };
        write().map_err(|e| Self::copy_error(request, format!("failed to write auth file: {}", e)))
    }

    fn copy_error(request: &CopyRequest, message: String) -> SyncError {
        SyncError::Copy {
            source_ref: request.source_ref.clone(),
            destination_ref: request.destination_ref.clone(),
            message,
        }
    }
}

#[async_trait]
impl ImageCopier for SkopeoCopier {
    async fn copy(&self, request: &CopyRequest) -> Result<()> {
        self.output.verbose(&format!(
            "{} copy docker://{} -> docker://{} ({})",
            self.binary, request.source_ref, request.destination_ref, request.compression
        ));

        // Both files must outlive the child
        let src_authfile = Self::write_auth_file(request, &request.source_ref, &request.source_auth)?;
        let dest_authfile =
            Self::write_auth_file(request, &request.destination_ref, &request.destination_auth)?;

        // kill_on_drop ties the child's lifetime to this future, so a timeout
        // in the caller terminates the transfer
        let child = Command::new(&self.binary)
            .args(Self::build_args(request, src_authfile.path(), dest_authfile.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::copy_error(request, format!("failed to launch {}: {}", self.binary, e)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Self::copy_error(request, format!("failed to wait for {}: {}", self.binary, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let excerpt = if stderr.len() > STDERR_EXCERPT {
            let mut start = stderr.len() - STDERR_EXCERPT;
            while !stderr.is_char_boundary(start) {
                start += 1;
            }
            &stderr[start..]
        } else {
            stderr
        };

        Err(Self::copy_error(
            request,
            format!("{} exited with {}: {}", self.binary, output.status, excerpt),
        ))
    }
}

/// Registry host of a `host/repository:tag` reference
fn registry_host(reference: &str) -> &str {
    reference.split_once('/').map_or(reference, |(host, _)| host)
}
