//! Logging and output control
//!
//! This module provides the [`Logger`] used by every component for user-visible
//! output. Diagnostic lines are emitted as `tracing` events so they can be
//! filtered with `RUST_LOG`; the end-of-run summary goes straight to stdout.

use std::time::{Duration, Instant};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    /// Install the global `tracing` subscriber. `RUST_LOG` wins over the
    /// verbosity flags when it is set.
    pub fn init_tracing(&self) {
        let default_level = if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        // A second initialization (tests, embedding) keeps the first subscriber
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init();
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            tracing::info!("=== {} ===", title);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            tracing::debug!("{}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            tracing::info!("{}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            tracing::info!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        tracing::warn!("⚠️  {}", message);
    }

    /// Error message
    pub fn error(&self, message: &str) {
        tracing::error!("❌ {}", message);
    }

    /// Step information
    pub fn step(&self, message: &str) {
        if !self.quiet {
            tracing::info!("▶️  {}", message);
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            tracing::debug!("   {}", message);
        }
    }

    /// Key-value summary printed to stdout regardless of the log filter
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            println!("\n📋 {}", title);
            println!("{}", "─".repeat(title.len() + 3));
            for (key, value) in items {
                println!("  {}: {}", key, value);
            }
        }
    }

    // Structured list output
    pub fn list(&self, title: &str, items: &[String]) {
        if !self.quiet {
            println!("\n--- {} ---", title);
            for (i, item) in items.iter().enumerate() {
                println!("  {}. {}", i + 1, item);
            }

            if items.is_empty() {
                println!("  (No items to display)");
            }
        }
    }

    /// Time since the logger was created
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        let logger = Logger::new(false);
        assert_eq!(logger.format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(logger.format_duration(Duration::from_secs(125)), "2m5s");
        assert_eq!(logger.format_duration(Duration::from_secs(3725)), "1h2m5s");
    }

    #[test]
    fn test_quiet_logger_flags() {
        let logger = Logger::new_quiet();
        assert!(logger.quiet);
        assert!(!logger.verbose);
    }
}
