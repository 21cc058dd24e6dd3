//! Error handling module for reelcap

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for reelcap operations outside the domain core
#[derive(Error, Debug)]
pub enum ReelcapError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Domain failure surfaced to the caller
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Output file write error
    #[error("Failed to write output file: {message}")]
    Output { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for reelcap operations
pub type ReelcapResult<T> = std::result::Result<T, ReelcapError>;
