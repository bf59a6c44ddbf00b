//! Per work item, per contributor accumulator

use dsr_domain::{ActivityRecord, Attributed, Window};
use serde::Serialize;

/// Activity of one contributor on one work item inside a window.
///
/// Keyed by `(item_id, author)`. Only records whose timestamp falls inside
/// the window are folded in; `total_seconds` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorLedger {
    item_id: String,
    author: String,
    author_email: Option<String>,
    total_seconds: u64,
    work_log_comments: Vec<String>,
    comments: Vec<String>,
    transitions: Vec<(String, String)>,
}

impl ContributorLedger {
    pub fn new(item_id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            author: author.into(),
            author_email: None,
            total_seconds: 0,
            work_log_comments: Vec::new(),
            comments: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Whether `record` would contribute to some ledger under `window`.
    ///
    /// Non-status changelog entries never contribute.
    pub fn admits(window: &Window, record: &ActivityRecord) -> bool {
        let relevant = match record {
            ActivityRecord::Transition(transition) => transition.is_status_change(),
            ActivityRecord::TimeLog(_) | ActivityRecord::Comment(_) => true,
        };
        relevant && window.contains(record.timestamp())
    }

    /// Fold one record into the ledger. Returns `true` when it was applied.
    ///
    /// Records by another author, outside `window`, or non-status changelog
    /// entries are ignored.
    pub fn fold(&mut self, window: &Window, record: &ActivityRecord) -> bool {
        if record.author() != self.author || !Self::admits(window, record) {
            return false;
        }

        match record {
            ActivityRecord::TimeLog(log) => {
                self.total_seconds = self.total_seconds.saturating_add(log.seconds);
                if !log.comment.trim().is_empty() {
                    self.work_log_comments.push(log.comment.clone());
                }
                if self.author_email.is_none() {
                    self.author_email = log.author_email.clone().filter(|email| !email.is_empty());
                }
            }
            ActivityRecord::Comment(comment) => {
                self.comments.push(comment.body.clone());
            }
            ActivityRecord::Transition(transition) => {
                self.transitions
                    .push((transition.from_status.clone(), transition.to_status.clone()));
            }
        }
        true
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Email taken from the contributor's first in-window time log.
    pub fn author_email(&self) -> Option<&str> {
        self.author_email.as_deref()
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    /// Comments attached to time logs, in source order.
    pub fn work_log_comments(&self) -> &[String] {
        &self.work_log_comments
    }

    /// Item comments written by the contributor, in source order.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn transitions(&self) -> &[(String, String)] {
        &self.transitions
    }

    /// Transitions rendered as `from->to`.
    pub fn transition_labels(&self) -> Vec<String> {
        self.transitions.iter().map(|(from, to)| format!("{from}->{to}")).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.total_seconds == 0
            && self.work_log_comments.is_empty()
            && self.comments.is_empty()
            && self.transitions.is_empty()
    }
}
