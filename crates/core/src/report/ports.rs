//! Port interface for report artifact storage

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dsr_domain::Result;

/// Persists rendered reports.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `content` at `relative_path`, replacing any existing artifact.
    ///
    /// Returns the location the artifact was written to.
    async fn write(&self, relative_path: &Path, content: &str) -> Result<PathBuf>;
}
