// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::domain::errors::*;
use crate::domain::model::*;

/// Remotely controlled video player
///
/// Only usable once `is_ready` reports true.
#[async_trait]
pub trait PlaybackSurface: Send + Sync {
    /// Whether the player finished loading and accepts commands
    async fn is_ready(&self) -> bool;

    /// Move the playhead to `seconds`
    async fn seek_to(&self, seconds: f64) -> Result<(), DomainError>;

    async fn play(&self) -> Result<(), DomainError>;

    async fn pause(&self) -> Result<(), DomainError>;

    /// Current playhead position in seconds
    async fn current_time(&self) -> Result<f64, DomainError>;

    async fn is_muted(&self) -> Result<bool, DomainError>;

    async fn unmute(&self) -> Result<(), DomainError>;

    /// Set output volume, 0..=100
    async fn set_volume(&self, volume: u8) -> Result<(), DomainError>;
}

/// What a capture stream must contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub video: bool,
    pub audio: bool,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Kind of media carried by a capture track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
    /// Audio and video delivered by a single source
    Muxed,
}

/// One underlying capture source
pub trait CaptureTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    /// Stop the source; may be called from any context
    fn stop(&self);
}

/// A live capture stream: encoded chunks in arrival order plus the tracks producing them
pub struct CaptureStream {
    pub chunks: mpsc::Receiver<Vec<u8>>,
    pub tracks: Vec<Box<dyn CaptureTrack>>,
}

/// Platform capture acquisition primitive
#[async_trait]
pub trait CapturePort: Send + Sync {
    /// Request a stream; may prompt the user.
    ///
    /// Fails with `PermissionDenied` when declined and `CaptureUnavailable` otherwise.
    async fn acquire(&self, request: CaptureRequest) -> Result<CaptureStream, DomainError>;
}

/// Signal telling whether the capture surface is foregrounded
pub trait VisibilityPort: Send + Sync {
    /// Subscribe; the current value counts as already seen
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Local key-value persistence of the source and clip list
#[async_trait]
pub trait ClipStorePort: Send + Sync {
    async fn save(&self, key: &str, state: &SavedState) -> Result<(), DomainError>;

    /// `Ok(None)` when nothing was saved under `key`
    async fn load(&self, key: &str) -> Result<Option<SavedState>, DomainError>;
}
