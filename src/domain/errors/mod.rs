// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// URL did not contain a recognizable source identifier
    InvalidUrl(String),
    /// Time text could not be parsed
    InvalidTime(String),
    /// Start is not strictly before end, or a bound is negative
    InvalidTimeRange(String),
    /// A clip with the same id is already queued
    DuplicateClip(String),
    /// No queued clip has the given id
    ClipNotFound(String),
    /// No source video has been loaded yet
    NoSource,
    /// Nothing to record
    EmptyQueue,
    /// User declined capture access
    PermissionDenied(String),
    /// Capture could not be acquired for another reason
    CaptureUnavailable(String),
    /// Another capture session is already active
    SessionBusy,
    /// The user left the capture surface mid-run
    CancelledByUser,
    /// The session finalized without any data
    NoContentCaptured,
    /// Playback surface has not reported ready
    SurfaceNotReady,
    /// Playback surface command failed
    Surface(String),
    /// Segment did not reach its end within the configured bound
    SegmentTimeout { start: f64, end: f64 },
    /// Persistence failed
    Storage(String),
    /// Internal error
    Internal(String),
}

impl DomainError {
    /// Validation errors are recovered locally and never start a run
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidUrl(_)
                | DomainError::InvalidTime(_)
                | DomainError::InvalidTimeRange(_)
                | DomainError::DuplicateClip(_)
                | DomainError::ClipNotFound(_)
                | DomainError::NoSource
                | DomainError::EmptyQueue
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidUrl(url) => write!(f, "Could not find a video id in: {}", url),
            DomainError::InvalidTime(msg) => write!(f, "Invalid time: {}", msg),
            DomainError::InvalidTimeRange(msg) => write!(f, "Invalid time range: {}", msg),
            DomainError::DuplicateClip(id) => write!(f, "Clip already queued: {}", id),
            DomainError::ClipNotFound(id) => write!(f, "Clip not found: {}", id),
            DomainError::NoSource => write!(f, "Load a video first"),
            DomainError::EmptyQueue => write!(f, "Add at least one clip before recording"),
            DomainError::PermissionDenied(msg) => write!(f, "Capture permission denied: {}", msg),
            DomainError::CaptureUnavailable(msg) => write!(f, "Capture unavailable: {}", msg),
            DomainError::SessionBusy => write!(f, "A recording is already in progress"),
            DomainError::CancelledByUser => write!(
                f,
                "Recording cancelled: stay on the player while the clips are being recorded"
            ),
            DomainError::NoContentCaptured => {
                write!(f, "Nothing was captured, please try again")
            }
            DomainError::SurfaceNotReady => write!(f, "Player is not ready yet"),
            DomainError::Surface(msg) => write!(f, "Player error: {}", msg),
            DomainError::SegmentTimeout { start, end } => write!(
                f,
                "Playback did not reach {:.3}s while recording {:.3}s-{:.3}s",
                end, start, end
            ),
            DomainError::Storage(msg) => write!(f, "Storage error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
