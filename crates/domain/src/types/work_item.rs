use serde::{Deserialize, Serialize};

/// A tracked unit of work as loaded from the issue tracker.
///
/// Fetched fresh per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub priority: String,
    pub assignee: Option<String>,
    pub status: String,
    pub estimated_seconds: u64,
    pub spent_seconds: u64,
}

impl WorkItem {
    /// Assignee display name, or `"Unassigned"`.
    pub fn assignee_label(&self) -> &str {
        self.assignee.as_deref().unwrap_or("Unassigned")
    }
}
