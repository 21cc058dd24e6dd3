// Queue interactor - Source selection and clip list editing with persistence

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::source_id::extract_id;

/// Interactor for the load/add/remove/list/clear use cases
pub struct QueueInteractor {
    store: Arc<dyn ClipStorePort>,
    key: String,
}

impl QueueInteractor {
    pub fn new(store: Arc<dyn ClipStorePort>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Select a new source; the clip list starts over
    pub async fn load_source(&self, url: &str) -> Result<SavedState, DomainError> {
        let source_id = extract_id(url).ok_or_else(|| DomainError::InvalidUrl(url.to_string()))?;

        if let Some(previous) = self.saved().await? {
            if previous.source_id != source_id && !previous.clips.is_empty() {
                info!(
                    previous = %previous.source_id,
                    dropped = previous.clips.len(),
                    "new source loaded, clearing clips"
                );
            }
        }

        let state = SavedState::new(source_id, &ClipQueue::new());
        self.store.save(&self.key, &state).await?;
        info!(source = %state.source_id, "source loaded");
        Ok(state)
    }

    /// Parse `MM:SS`/`HH:MM:SS` bounds and queue the clip
    pub async fn add_clip(&self, start_text: &str, end_text: &str) -> Result<Clip, DomainError> {
        let (start, end) = ClipEntryRule::parse_range(start_text, end_text)?;
        let state = self.current().await?;
        let mut queue = state.queue()?;

        let clip = queue.insert_range(start, end)?;
        self.store
            .save(&self.key, &SavedState::new(state.source_id, &queue))
            .await?;
        info!(clip = %clip, id = %clip.id, "clip added");
        Ok(clip)
    }

    /// Remove by full id or by an unambiguous id prefix
    pub async fn remove_clip(&self, id_text: &str) -> Result<Clip, DomainError> {
        let state = self.current().await?;
        let mut queue = state.queue()?;

        let id = resolve_id(&queue, id_text)?;
        let removed = queue.remove(&id)?;
        self.store
            .save(&self.key, &SavedState::new(state.source_id, &queue))
            .await?;
        info!(clip = %removed, "clip removed");
        Ok(removed)
    }

    /// Drop every clip but keep the source
    pub async fn clear(&self) -> Result<usize, DomainError> {
        let state = self.current().await?;
        let removed = state.clips.len();
        self.store
            .save(&self.key, &SavedState::new(state.source_id, &ClipQueue::new()))
            .await?;
        info!(removed, "clip list cleared");
        Ok(removed)
    }

    /// Saved state, or `None` before the first `load_source`
    pub async fn saved(&self) -> Result<Option<SavedState>, DomainError> {
        self.store.load(&self.key).await
    }

    /// Saved state; `NoSource` before the first `load_source`
    pub async fn current(&self) -> Result<SavedState, DomainError> {
        self.saved().await?.ok_or(DomainError::NoSource)
    }

    /// Like `saved`, but a storage failure only warns
    pub async fn saved_or_warn(&self) -> Option<SavedState> {
        match self.saved().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "could not read saved clips");
                None
            }
        }
    }
}

fn resolve_id(queue: &ClipQueue, id_text: &str) -> Result<ClipId, DomainError> {
    if let Ok(id) = id_text.parse::<ClipId>() {
        return Ok(id);
    }

    let prefix = id_text.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        return Err(DomainError::ClipNotFound(id_text.to_string()));
    }
    let mut matches = queue
        .iter()
        .filter(|clip| clip.id.to_string().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(clip), None) => Ok(clip.id),
        _ => Err(DomainError::ClipNotFound(id_text.to_string())),
    }
}
