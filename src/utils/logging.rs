//! Logging configuration and subscriber setup

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{ReelcapError, ReelcapResult};

/// Logging configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level or filter directive
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Pretty,
    /// Compact text format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LogFormat {
    pub fn parse(value: &str) -> ReelcapResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(ReelcapError::Config {
                message: format!("Invalid log format: {}. Valid formats: pretty, compact, json", other),
            }),
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Calling this twice
/// keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig) -> ReelcapResult<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.is_empty() => EnvFilter::try_new(directive),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| ReelcapError::Config {
        message: format!("Invalid log level '{}': {}", config.level, e),
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if result.is_ok() {
        tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
    }
    Ok(())
}

/// Log version and platform once at startup
pub fn log_system_info() {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "reelcap starting");

    #[cfg(target_os = "macos")]
    tracing::debug!("Platform: macOS");
    #[cfg(target_os = "linux")]
    tracing::debug!("Platform: Linux");
    #[cfg(target_os = "windows")]
    tracing::debug!("Platform: Windows");
}
