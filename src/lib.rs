//! reelcap library
//!
//! Clip sequencing and capture orchestration: drive a remote playback
//! surface through an ordered list of time ranges while a capture session
//! records its output, then assemble the captured chunks into one artifact.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{Artifact, Clip, ClipId, ClipQueue, ClipSnapshot, SavedState};
pub use engine::{Orchestrator, SegmentTiming};
pub use error::{ReelcapError, ReelcapResult};
