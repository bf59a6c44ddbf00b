//! Report rendering
//!
//! Turns one contributor's ledgers into a materialized artifact. Exactly one
//! artifact is written per contributor, project and publish date; the path
//! is deterministic so a same-day rerun overwrites it.

pub mod context;
pub mod document;
pub mod naming;
pub mod ports;
pub mod tabular;

use std::path::PathBuf;
use std::sync::Arc;

use dsr_domain::{ReportFormat, Result};
use tracing::{debug, instrument};

pub use context::{PublishStamp, ReportContext};
pub use naming::artifact_path;
pub use ports::ArtifactStore;

/// A rendered and stored report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub format: ReportFormat,
    pub relative_path: PathBuf,
    pub location: PathBuf,
    pub content: String,
}

impl RenderedReport {
    pub fn file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("report.{}", self.format.extension()))
    }
}

/// Render a report body without storing it.
///
/// # Errors
/// Returns `DsrError::Render` if a ledger refers to an unknown work item.
pub fn render_content(format: ReportFormat, ctx: &ReportContext<'_>) -> Result<String> {
    match format {
        ReportFormat::Tabular => tabular::render(ctx),
        ReportFormat::Document => document::render(ctx),
    }
}

/// Renders reports and persists them through an [`ArtifactStore`].
pub struct ReportRenderer {
    store: Arc<dyn ArtifactStore>,
}

impl ReportRenderer {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Render `ctx` in `format` and write it to its deterministic path.
    #[instrument(skip(self, ctx), fields(project = %ctx.project, contributor = %ctx.contributor))]
    pub async fn render(&self, format: ReportFormat, ctx: &ReportContext<'_>) -> Result<RenderedReport> {
        let content = render_content(format, ctx)?;
        let relative_path = artifact_path(ctx.project, ctx.contributor, &ctx.publish.date_label(), format);
        let location = self.store.write(&relative_path, &content).await?;
        debug!(path = %location.display(), bytes = content.len(), "wrote report artifact");

        Ok(RenderedReport { format, relative_path, location, content })
    }
}
