// JSON store adapter - Clip list persistence as one JSON file per key

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Stores each key as `<dir>/<key>.json`
pub struct JsonStoreAdapter {
    dir: PathBuf,
}

impl JsonStoreAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf, DomainError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(DomainError::Storage(format!("invalid store key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<(), DomainError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| DomainError::Storage(format!("failed to create store directory: {}", e)))?;
        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| DomainError::Storage(format!("failed to create temporary file: {}", e)))?;
        temp.write_all(content)
            .map_err(|e| DomainError::Storage(format!("failed to write state: {}", e)))?;
        temp.persist(path)
            .map_err(|e| DomainError::Storage(format!("failed to replace state file: {}", e.error)))?;
        Ok(())
    }
}

#[async_trait]
impl ClipStorePort for JsonStoreAdapter {
    async fn save(&self, key: &str, state: &SavedState) -> Result<(), DomainError> {
        let path = self.path_for(key)?;
        let content = serde_json::to_vec_pretty(state)
            .map_err(|e| DomainError::Storage(format!("failed to encode state: {}", e)))?;
        self.write_atomic(&path, &content)?;
        info!(key, clips = state.clips.len(), "clip list saved");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<SavedState>, DomainError> {
        let path = self.path_for(key)?;
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "no saved clip list");
                return Ok(None);
            }
            Err(e) => {
                return Err(DomainError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let state: SavedState = serde_json::from_slice(&content).map_err(|e| {
            DomainError::Storage(format!("corrupt state in {}: {}", path.display(), e))
        })?;
        debug!(key, clips = state.clips.len(), "clip list loaded");
        Ok(Some(state))
    }
}
