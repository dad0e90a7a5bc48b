//! On-disk artifact storage for staged uploads and analysis outputs.
//!
//! The gateway owns staging; the worker owns output creation and staged
//! input deletion. Both directories are created on demand. Paths are
//! handed around as strings because they cross the queue inside the
//! dispatch message payload.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::naming::{output_file_name, staged_file_name};
use crate::types::JobId;

/// Default directory for staged (not yet processed) uploads.
const DEFAULT_STAGING_DIR: &str = "staging";

/// Default directory for analysis output files.
const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Filesystem store for input and output artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    staging_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(staging_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Build from `STAGING_DIR` / `OUTPUT_DIR` environment variables,
    /// defaulting to `staging/` and `outputs/` in the working directory.
    pub fn from_env() -> Self {
        let staging = std::env::var("STAGING_DIR").unwrap_or_else(|_| DEFAULT_STAGING_DIR.into());
        let output = std::env::var("OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.into());
        Self::new(staging, output)
    }

    /// Persist an uploaded document to the staging area.
    ///
    /// The file is keyed by `artifact_id`, not the job id, so repeated
    /// uploads of the same filename never collide. Returns the staged
    /// path; on failure nothing is left behind.
    pub async fn stage(
        &self,
        artifact_id: JobId,
        source_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, CoreError> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let path = self.staging_dir.join(staged_file_name(artifact_id, source_name));
        if let Err(err) = tokio::fs::write(&path, bytes).await {
            // A partial write must not survive as a stray staged file.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(err.into());
        }
        Ok(path)
    }

    /// Write an analysis result to the output area and return its path.
    pub async fn write_output(
        &self,
        job_id: JobId,
        source_name: &str,
        text: &str,
    ) -> Result<PathBuf, CoreError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(output_file_name(source_name, job_id));
        tokio::fs::write(&path, text).await?;
        Ok(path)
    }

    /// Delete a staged input. Best-effort: a missing file is fine, any
    /// other failure is reported so the caller can log it.
    pub async fn remove_staged(&self, path: &Path) -> Result<(), CoreError> {
        remove_if_present(path).await
    }

    /// Delete an output file that lost its owning record (the job was
    /// deleted or finished elsewhere while the result was being
    /// written). Same tolerance as [`ArtifactStore::remove_staged`].
    pub async fn remove_output(&self, path: &Path) -> Result<(), CoreError> {
        remove_if_present(path).await
    }
}

async fn remove_if_present(path: &Path) -> Result<(), CoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
