//! Port interfaces for the issue tracker
//!
//! These traits define the boundary between aggregation logic and the
//! tracker client. Adapters return raw, unfiltered activity; the window
//! filter is applied by the ledger.

use std::sync::Arc;

use async_trait::async_trait;
use dsr_domain::{ActivityRecord, ProjectConfig, Result, Window, WorkItem};

/// Read access to one issue-tracker server.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Resolve the display name of a project key.
    ///
    /// Fails with `NotFound` when the key does not exist on the server.
    async fn project_name(&self, project_key: &str) -> Result<String>;

    /// Identifiers of items created or updated inside `window`, oldest
    /// update first. An empty result is not an error.
    async fn find_changed_items(&self, project_id: &str, window: &Window) -> Result<Vec<String>>;

    /// Load a single work item.
    async fn load_item(&self, item_id: &str) -> Result<WorkItem>;

    /// Every time log, comment and changelog entry of the item, regardless
    /// of `window`, in source order.
    ///
    /// Fails with `DsrError::ActivitySource` on transport or auth errors.
    async fn load_activity(&self, item_id: &str, window: &Window) -> Result<Vec<ActivityRecord>>;
}

/// Factory that opens an [`ActivitySource`] for a project descriptor.
#[async_trait]
pub trait ActivitySourceProvider: Send + Sync {
    /// Connect to the project's tracker server.
    async fn connect(&self, project: &ProjectConfig) -> Result<Arc<dyn ActivitySource>>;
}
