//! Filesystem artifact store
//!
//! Artifacts are written below the base path, keeping the relative layout
//! chosen by the renderer (`reports/{project}/{publish_date}/...`).

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use dsr_core::ArtifactStore;
use dsr_domain::{DsrError, Result};

use crate::errors::to_dsr;

/// Writes artifacts to the local filesystem.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { root: base_path.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write(&self, relative_path: &Path, content: &str) -> Result<PathBuf> {
        if relative_path.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(DsrError::InvalidInput(format!(
                "artifact path must be relative and normalized: {}",
                relative_path.display()
            )));
        }

        let target = self.root.join(relative_path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(to_dsr)?;
        }
        tokio::fs::write(&target, content.as_bytes()).await.map_err(to_dsr)?;

        tracing::debug!(path = %target.display(), bytes = content.len(), "artifact written");
        Ok(target)
    }
}
