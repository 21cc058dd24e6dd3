//! Progress reporting for UI integration

use std::sync::Mutex;

use crate::domain::model::{ClipProgress, RunStatus};

/// Receives progress and the terminal status of a recording run
pub trait ProgressCallback: Send + Sync {
    /// Called before each clip starts playing
    fn on_clip(&self, progress: &ClipProgress);

    /// Called exactly once when the run ends
    fn on_status(&self, status: &RunStatus);
}

/// One reported progress item
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Clip(ClipProgress),
    Status(RunStatus),
}

/// Console progress callback for CLI usage
pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_clip(&self, progress: &ClipProgress) {
        let percent = (progress.index - 1) as f64 / progress.total.max(1) as f64 * 100.0;
        let bar_length = 20;
        let filled = (percent / 100.0 * bar_length as f64) as usize;
        let bar = "#".repeat(filled) + &"-".repeat(bar_length - filled);
        println!("[{}] {}", bar, progress);
    }

    fn on_status(&self, status: &RunStatus) {
        match status {
            RunStatus::Done { .. } => println!("Done"),
            RunStatus::Failed(e) => println!("Error: {}", e),
        }
    }
}

/// JSON progress callback for structured output
pub struct JsonProgressCallback;

impl ProgressCallback for JsonProgressCallback {
    fn on_clip(&self, progress: &ClipProgress) {
        let event = serde_json::json!({
            "event": "clip",
            "index": progress.index,
            "total": progress.total,
            "clip_id": progress.clip.id.to_string(),
            "start": progress.clip.start,
            "end": progress.clip.end,
            "message": progress.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_status(&self, status: &RunStatus) {
        let event = match status {
            RunStatus::Done { size } => serde_json::json!({
                "event": "done",
                "size": size,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
            RunStatus::Failed(e) => serde_json::json!({
                "event": "error",
                "message": e.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
        };
        println!("{}", event);
    }
}

/// Keeps every event in order; handy for embedding and tests
#[derive(Default)]
pub struct ProgressHistory {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Terminal status, if the run finished
    pub fn status(&self) -> Option<RunStatus> {
        self.events().into_iter().rev().find_map(|e| match e {
            ProgressEvent::Status(status) => Some(status),
            ProgressEvent::Clip(_) => None,
        })
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressCallback for ProgressHistory {
    fn on_clip(&self, progress: &ClipProgress) {
        self.push(ProgressEvent::Clip(progress.clone()));
    }

    fn on_status(&self, status: &RunStatus) {
        self.push(ProgressEvent::Status(status.clone()));
    }
}
