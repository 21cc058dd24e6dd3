//! Artifact file writer

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::domain::model::Artifact;
use crate::error::{ReelcapError, ReelcapResult};
use crate::output::OverwritePolicy;

/// Writes finished recordings into an output directory
pub struct ArtifactWriter {
    output_dir: PathBuf,
    overwrite: OverwritePolicy,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>, overwrite: OverwritePolicy) -> Self {
        Self {
            output_dir: output_dir.into(),
            overwrite,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination of the recording for `source_id`
    pub fn target_path(&self, artifact: &Artifact, source_id: &str) -> PathBuf {
        self.output_dir.join(artifact.file_name(source_id))
    }

    /// Write the artifact under its derived name and return the final path
    pub fn write(&self, artifact: &Artifact, source_id: &str) -> ReelcapResult<PathBuf> {
        let path = self.target_path(artifact, source_id);
        info!("Writing recording: {}", path.display());

        self.check_overwrite_policy(&path)?;
        std::fs::create_dir_all(&self.output_dir).map_err(|e| ReelcapError::Output {
            message: format!("Failed to create output directory: {}", e),
        })?;
        self.write_atomic(&path, &artifact.bytes)?;

        info!(bytes = artifact.size(), "Recording written: {}", path.display());
        Ok(path)
    }

    /// Write to a sibling temporary file, then rename over the target
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> ReelcapResult<()> {
        let mut temp = NamedTempFile::new_in(&self.output_dir).map_err(|e| ReelcapError::Output {
            message: format!("Failed to create temporary file: {}", e),
        })?;

        temp.write_all(bytes).map_err(|e| ReelcapError::Output {
            message: format!("Failed to write data: {}", e),
        })?;
        temp.as_file().sync_all().map_err(|e| ReelcapError::Output {
            message: format!("Failed to sync file to disk: {}", e),
        })?;
        temp.persist(path).map_err(|e| ReelcapError::Output {
            message: format!("Failed to rename temporary file: {}", e.error),
        })?;
        Ok(())
    }

    fn check_overwrite_policy(&self, path: &Path) -> ReelcapResult<()> {
        if !path.exists() {
            return Ok(());
        }
        match self.overwrite {
            OverwritePolicy::Never => Err(ReelcapError::Output {
                message: format!(
                    "{} exists and overwrite is disabled",
                    path.display()
                ),
            }),
            OverwritePolicy::Prompt => {
                warn!("File exists, proceeding with overwrite (non-interactive mode)");
                Ok(())
            }
            OverwritePolicy::Always => {
                info!("File exists, will overwrite");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(bytes: &[u8]) -> Artifact {
        Artifact::from_chunks(vec![bytes.to_vec()]).unwrap()
    }

    #[test]
    fn test_writes_under_derived_name() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("out"), OverwritePolicy::Always);

        let path = writer.write(&artifact(b"abc"), "dQw4w9WgXcQ").unwrap();

        assert_eq!(path.file_name().unwrap(), "dQw4w9WgXcQ-clips.webm");
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn test_never_policy_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path(), OverwritePolicy::Never);
        let existing = dir.path().join("id-clips.webm");
        std::fs::write(&existing, b"old").unwrap();

        let result = writer.write(&artifact(b"new"), "id");

        assert!(matches!(result, Err(ReelcapError::Output { .. })));
        assert_eq!(std::fs::read(&existing).unwrap(), b"old");
    }

    #[test]
    fn test_always_policy_replaces_file() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path(), OverwritePolicy::Always);
        std::fs::write(dir.path().join("id-clips.webm"), b"old").unwrap();

        let path = writer.write(&artifact(b"new"), "id").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Never".parse::<OverwritePolicy>().unwrap(), OverwritePolicy::Never);
        assert!("sometimes".parse::<OverwritePolicy>().is_err());
        assert_eq!(OverwritePolicy::default().to_string(), "prompt");
    }
}
