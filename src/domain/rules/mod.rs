// Domain rules - Business logic and policies

use std::time::Duration;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::utils::time::parse_clock;

/// Rules for turning user-entered time text into a clip range
pub struct ClipEntryRule;

impl ClipEntryRule {
    /// Parse start/end text and validate the resulting range
    pub fn parse_range(start_text: &str, end_text: &str) -> Result<(f64, f64), DomainError> {
        let start = parse_clock(start_text)
            .map_err(|e| DomainError::InvalidTime(format!("start: {}", e)))?;
        let end =
            parse_clock(end_text).map_err(|e| DomainError::InvalidTime(format!("end: {}", e)))?;
        validate_range(start, end)?;
        Ok((start, end))
    }

    /// Parse and insert into the queue; the queue is unchanged on error
    pub fn add_to_queue(
        queue: &mut ClipQueue,
        start_text: &str,
        end_text: &str,
    ) -> Result<Clip, DomainError> {
        let (start, end) = Self::parse_range(start_text, end_text)?;
        queue.insert_range(start, end)
    }
}

/// How long a segment may take to reach its end.
///
/// Unbounded unless a slack is configured; a stalled player then hangs the run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SegmentWaitPolicy {
    pub slack: Option<Duration>,
}

impl SegmentWaitPolicy {
    pub fn unbounded() -> Self {
        Self { slack: None }
    }

    pub fn with_slack(slack: Duration) -> Self {
        Self { slack: Some(slack) }
    }

    /// Maximum wait for `[start, end)`, or `None` when unbounded
    pub fn max_wait(&self, start: f64, end: f64) -> Option<Duration> {
        let slack = self.slack?;
        let span = Duration::try_from_secs_f64((end - start).max(0.0)).unwrap_or(Duration::MAX);
        Some(span.saturating_add(slack))
    }
}
