//! Drives the playback surface through a single clip range

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::validate_range;
use crate::domain::rules::SegmentWaitPolicy;
use crate::ports::PlaybackSurface;

/// Reference sampling period of the playhead
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Reference delay after pausing so the last frame reaches the recording
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Timing knobs for segment playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTiming {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub wait_policy: SegmentWaitPolicy,
}

impl SegmentTiming {
    pub fn new(poll_interval: Duration, settle_delay: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            settle_delay,
            wait_policy: SegmentWaitPolicy::unbounded(),
        }
    }

    pub fn with_wait_policy(mut self, wait_policy: SegmentWaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }
}

impl Default for SegmentTiming {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY)
    }
}

/// Play `[start, end)` on `surface` and resolve once it has been rendered.
///
/// Seeks, plays, samples the playhead every `poll_interval` until it reaches
/// `end`, pauses, then waits `settle_delay`. Without a wait bound a stalled
/// player keeps this future pending. Dropping the future stops the sampling.
pub async fn play_segment(
    surface: &dyn PlaybackSurface,
    start: f64,
    end: f64,
    timing: &SegmentTiming,
) -> Result<(), DomainError> {
    validate_range(start, end)?;
    debug!(start, end, "playing segment");

    surface.seek_to(start).await?;
    surface.play().await?;

    let reached = wait_for_position(surface, end, timing.poll_interval);
    let position = match timing.wait_policy.max_wait(start, end) {
        Some(limit) => match tokio::time::timeout(limit, reached).await {
            Ok(position) => position?,
            Err(_) => {
                warn!(start, end, ?limit, "segment did not reach its end in time");
                if let Err(e) = surface.pause().await {
                    warn!(error = %e, "failed to pause after segment timeout");
                }
                return Err(DomainError::SegmentTimeout { start, end });
            }
        },
        None => reached.await?,
    };

    surface.pause().await?;
    debug!(position, settle = ?timing.settle_delay, "segment reached end, settling");
    tokio::time::sleep(timing.settle_delay).await;
    Ok(())
}

/// Sample the playhead until it is at or past `end`
async fn wait_for_position(
    surface: &dyn PlaybackSurface,
    end: f64,
    poll_interval: Duration,
) -> Result<f64, DomainError> {
    let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let position = surface.current_time().await?;
        if position >= end {
            return Ok(position);
        }
    }
}
