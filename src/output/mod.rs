//! Recording output module

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReelcapError;

pub mod writer;

pub use writer::ArtifactWriter;

/// Overwrite policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Ask before overwriting; non-interactive runs overwrite with a warning
    #[default]
    Prompt,
    /// Always overwrite
    Always,
    /// Never overwrite
    Never,
}

impl FromStr for OverwritePolicy {
    type Err = ReelcapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "prompt" => Ok(OverwritePolicy::Prompt),
            "always" => Ok(OverwritePolicy::Always),
            "never" => Ok(OverwritePolicy::Never),
            other => Err(ReelcapError::Config {
                message: format!("Invalid overwrite policy: {}", other),
            }),
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverwritePolicy::Prompt => "prompt",
            OverwritePolicy::Always => "always",
            OverwritePolicy::Never => "never",
        };
        write!(f, "{}", name)
    }
}
