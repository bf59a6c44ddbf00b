use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dsr_core::dispatch::{MailTransport, OutboundMessage};
use dsr_core::report::ArtifactStore;
use dsr_domain::{DsrError, Result as DomainResult};

/// Artifact store that keeps written files in memory, keyed by path.
#[derive(Default, Clone)]
pub struct MemoryArtifactStore {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> BTreeMap<PathBuf, String> {
        self.files.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn write(&self, relative_path: &Path, content: &str) -> DomainResult<PathBuf> {
        *self.writes.lock().unwrap() += 1;
        self.files.lock().unwrap().insert(relative_path.to_path_buf(), content.to_string());
        Ok(Path::new("/memory").join(relative_path))
    }
}

/// Transport that records every message it is handed.
#[derive(Default, Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail_subjects_containing: Arc<Mutex<Option<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, fragment: &str) -> Self {
        *self.fail_subjects_containing.lock().unwrap() = Some(fragment.to_string());
        self
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> DomainResult<()> {
        if let Some(fragment) = self.fail_subjects_containing.lock().unwrap().as_deref() {
            if message.subject.contains(fragment) {
                return Err(DsrError::Dispatch(format!("rejected {}", message.subject)));
            }
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
