// Domain models - Core types and data structures

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::utils::time::format_clock;

/// Fixed container extension of every recording
pub const RECORDING_EXTENSION: &str = "webm";

/// Opaque unique clip token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(Uuid);

impl ClipId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClipId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DomainError::ClipNotFound(s.to_string()))
    }
}

/// A time range `[start, end)` within the source video, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub start: f64,
    pub end: f64,
}

impl Clip {
    /// Create a clip with a fresh id
    pub fn new(start: f64, end: f64) -> Result<Self, DomainError> {
        Self::with_id(ClipId::new(), start, end)
    }

    /// Create a clip with a known id, validating the range
    pub fn with_id(id: ClipId, start: f64, end: f64) -> Result<Self, DomainError> {
        validate_range(start, end)?;
        Ok(Self { id, start, end })
    }

    /// Length of the range in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", format_clock(self.start), format_clock(self.end))
    }
}

/// Validate a candidate `[start, end)` range
pub fn validate_range(start: f64, end: f64) -> Result<(), DomainError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(DomainError::InvalidTimeRange(
            "start and end must be numbers".to_string(),
        ));
    }
    if start < 0.0 {
        return Err(DomainError::InvalidTimeRange(
            "start cannot be negative".to_string(),
        ));
    }
    if start >= end {
        return Err(DomainError::InvalidTimeRange(format!(
            "start ({}) must be before end ({})",
            format_clock(start),
            format_clock(end)
        )));
    }
    Ok(())
}

/// Ordered, id-deduplicated collection of clips for the loaded source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipQueue {
    clips: Vec<Clip>,
}

impl ClipQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a queue from persisted clips, re-validating each one
    pub fn from_clips(clips: Vec<Clip>) -> Result<Self, DomainError> {
        let mut queue = Self::new();
        for clip in clips {
            queue.insert(clip)?;
        }
        Ok(queue)
    }

    /// Insert a clip, keeping the queue sorted by start.
    ///
    /// The sort is stable, so clips with equal starts stay in insertion order.
    /// A rejected clip leaves the queue untouched.
    pub fn insert(&mut self, clip: Clip) -> Result<(), DomainError> {
        validate_range(clip.start, clip.end)?;
        if self.contains(&clip.id) {
            return Err(DomainError::DuplicateClip(clip.id.to_string()));
        }
        self.clips.push(clip);
        self.clips.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(())
    }

    /// Validate and insert a new range, returning the created clip
    pub fn insert_range(&mut self, start: f64, end: f64) -> Result<Clip, DomainError> {
        let clip = Clip::new(start, end)?;
        self.insert(clip.clone())?;
        Ok(clip)
    }

    /// Remove a clip by id
    pub fn remove(&mut self, id: &ClipId) -> Result<Clip, DomainError> {
        let index = self
            .clips
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| DomainError::ClipNotFound(id.to_string()))?;
        Ok(self.clips.remove(index))
    }

    pub fn clear(&mut self) {
        self.clips.clear();
    }

    pub fn contains(&self, id: &ClipId) -> bool {
        self.clips.iter().any(|c| &c.id == id)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }

    pub fn as_slice(&self) -> &[Clip] {
        &self.clips
    }

    /// Freeze the current order for a recording run
    pub fn snapshot(&self) -> ClipSnapshot {
        ClipSnapshot {
            clips: Arc::from(self.clips.as_slice()),
        }
    }
}

/// Read-only copy of a queue taken when a run starts
#[derive(Debug, Clone)]
pub struct ClipSnapshot {
    clips: Arc<[Clip]>,
}

impl ClipSnapshot {
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }

    /// Total playback time across all clips
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(Clip::duration).sum()
    }
}

/// Persisted source and clip list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub source_id: String,
    pub clips: Vec<Clip>,
    pub saved_at: DateTime<Utc>,
}

impl SavedState {
    pub fn new(source_id: impl Into<String>, queue: &ClipQueue) -> Self {
        Self {
            source_id: source_id.into(),
            clips: queue.as_slice().to_vec(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild the queue from the saved clips
    pub fn queue(&self) -> Result<ClipQueue, DomainError> {
        ClipQueue::from_clips(self.clips.clone())
    }
}

/// Lifecycle of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Recording,
    Finalizing,
    Done,
    Aborted,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Done | SessionStatus::Aborted | SessionStatus::Failed
        )
    }
}

/// Final concatenated recording
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub chunk_count: usize,
    pub extension: &'static str,
}

impl Artifact {
    /// Concatenate chunks in arrival order
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Option<Self> {
        if chunks.is_empty() {
            return None;
        }
        let chunk_count = chunks.len();
        Some(Self {
            bytes: chunks.concat(),
            chunk_count,
            extension: RECORDING_EXTENSION,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Download name derived from the source identifier
    pub fn file_name(&self, source_id: &str) -> String {
        format!("{}-clips.{}", source_id, self.extension)
    }
}

/// Progress of an orchestration run, one per clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipProgress {
    pub index: usize,
    pub total: usize,
    pub clip: Clip,
}

impl fmt::Display for ClipProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Recording clip {} of {} ({})",
            self.index, self.total, self.clip
        )
    }
}

/// Terminal status of a run as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Done { size: usize },
    Failed(DomainError),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Done { .. } => write!(f, "Done"),
            RunStatus::Failed(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests;
