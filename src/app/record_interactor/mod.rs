// Record interactor - "Create video" use case from saved clips to a file on disk

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::Orchestrator;
use crate::error::ReelcapResult;
use crate::output::ArtifactWriter;
use crate::ports::*;

/// Result of a successful recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub path: PathBuf,
    pub size: usize,
    pub clips: usize,
    pub source_id: String,
}

/// Interactor for the recording use case
pub struct RecordInteractor {
    store: Arc<dyn ClipStorePort>,
    key: String,
    orchestrator: Arc<Orchestrator>,
    writer: ArtifactWriter,
}

impl RecordInteractor {
    pub fn new(
        store: Arc<dyn ClipStorePort>,
        key: impl Into<String>,
        orchestrator: Arc<Orchestrator>,
        writer: ArtifactWriter,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            orchestrator,
            writer,
        }
    }

    /// Saved source and clips to record; `NoSource` / `EmptyQueue` when there is nothing
    pub async fn prepare(&self) -> Result<SavedState, DomainError> {
        let state = self.store.load(&self.key).await?.ok_or(DomainError::NoSource)?;
        if state.clips.is_empty() {
            return Err(DomainError::EmptyQueue);
        }
        Ok(state)
    }

    /// Record `state`'s clips from `surface` and write the artifact
    pub async fn record(
        &self,
        state: &SavedState,
        surface: &dyn PlaybackSurface,
    ) -> ReelcapResult<RecordOutcome> {
        let snapshot = state.queue()?.snapshot();
        info!(
            source = %state.source_id,
            clips = snapshot.len(),
            seconds = snapshot.total_duration(),
            "starting recording run"
        );

        let artifact = self.orchestrator.create_video(&snapshot, surface).await?;
        let path = self.writer.write(&artifact, &state.source_id)?;

        Ok(RecordOutcome {
            path,
            size: artifact.size(),
            clips: snapshot.len(),
            source_id: state.source_id.clone(),
        })
    }
}
