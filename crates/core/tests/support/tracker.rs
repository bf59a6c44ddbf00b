use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dsr_core::activity::{ActivitySource, ActivitySourceProvider};
use dsr_domain::{ActivityRecord, DsrError, ProjectConfig, Result as DomainResult, Window, WorkItem};

/// In-memory issue tracker.
///
/// Items are returned in insertion order. Individual items can be marked as
/// failing to exercise partial-failure handling.
#[derive(Default, Clone)]
pub struct MockActivitySource {
    project_names: Arc<Mutex<HashMap<String, String>>>,
    items: Arc<Mutex<Vec<(WorkItem, Vec<ActivityRecord>)>>>,
    failing_items: Arc<Mutex<Vec<String>>>,
    search_error: Arc<Mutex<Option<DsrError>>>,
    activity_calls: Arc<Mutex<usize>>,
}

impl MockActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, key: &str, name: &str) -> Self {
        self.project_names.lock().unwrap().insert(key.to_string(), name.to_string());
        self
    }

    pub fn with_item(self, item: WorkItem, records: Vec<ActivityRecord>) -> Self {
        self.items.lock().unwrap().push((item, records));
        self
    }

    pub fn with_failing_item(self, item: WorkItem) -> Self {
        self.failing_items.lock().unwrap().push(item.id.clone());
        self.items.lock().unwrap().push((item, Vec::new()));
        self
    }

    pub fn with_search_error(self, err: DsrError) -> Self {
        *self.search_error.lock().unwrap() = Some(err);
        self
    }

    pub fn activity_calls(&self) -> usize {
        *self.activity_calls.lock().unwrap()
    }
}

#[async_trait]
impl ActivitySource for MockActivitySource {
    async fn project_name(&self, project_key: &str) -> DomainResult<String> {
        self.project_names
            .lock()
            .unwrap()
            .get(project_key)
            .cloned()
            .ok_or_else(|| DsrError::NotFound(format!("project {project_key}")))
    }

    async fn find_changed_items(&self, _project_id: &str, _window: &Window) -> DomainResult<Vec<String>> {
        if let Some(err) = self.search_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.items.lock().unwrap().iter().map(|(item, _)| item.id.clone()).collect())
    }

    async fn load_item(&self, item_id: &str) -> DomainResult<WorkItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|(item, _)| item.id == item_id)
            .map(|(item, _)| item.clone())
            .ok_or_else(|| DsrError::NotFound(item_id.to_string()))
    }

    async fn load_activity(&self, item_id: &str, _window: &Window) -> DomainResult<Vec<ActivityRecord>> {
        *self.activity_calls.lock().unwrap() += 1;
        if self.failing_items.lock().unwrap().iter().any(|id| id == item_id) {
            return Err(DsrError::activity_source(item_id, "HTTP 500 Internal Server Error"));
        }
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|(item, _)| item.id == item_id)
            .map(|(_, records)| records.clone())
            .ok_or_else(|| DsrError::NotFound(item_id.to_string()))
    }
}

/// Provider returning a preconfigured source per project key.
#[derive(Default, Clone)]
pub struct MockSourceProvider {
    sources: Arc<Mutex<HashMap<String, MockActivitySource>>>,
    unreachable: Arc<Mutex<Vec<String>>>,
}

impl MockSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(self, key: &str, source: MockActivitySource) -> Self {
        self.sources.lock().unwrap().insert(key.to_string(), source);
        self
    }

    pub fn with_unreachable(self, key: &str) -> Self {
        self.unreachable.lock().unwrap().push(key.to_string());
        self
    }
}

#[async_trait]
impl ActivitySourceProvider for MockSourceProvider {
    async fn connect(&self, project: &ProjectConfig) -> DomainResult<Arc<dyn ActivitySource>> {
        if self.unreachable.lock().unwrap().contains(&project.key) {
            return Err(DsrError::Network("HTTP connection failure".into()));
        }
        let source = self
            .sources
            .lock()
            .unwrap()
            .get(&project.key)
            .cloned()
            .unwrap_or_default();
        Ok(Arc::new(source))
    }
}
