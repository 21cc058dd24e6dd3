//! Recording engine: segment playback, capture sessions and run orchestration

pub mod cancellation;
pub mod capture_session;
pub mod orchestrator;
pub mod progress;
pub mod segment_player;

pub use cancellation::CancellationWatcher;
pub use capture_session::{CaptureSession, CaptureSessionManager, SessionHandle};
pub use orchestrator::Orchestrator;
pub use progress::{ConsoleProgressCallback, JsonProgressCallback, ProgressCallback, ProgressHistory};
pub use segment_player::{play_segment, SegmentTiming};
