//! Retention classification
//!
//! Pure decision step of artifact pruning: given the candidates of a scan,
//! decide which survive. The filesystem walk and the delete/archive actions
//! live in the infrastructure layer.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use dsr_domain::{RetentionCandidate, RetentionPolicy};

/// What happens to a rejected candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionAction {
    Delete,
    Archive,
}

impl RetentionAction {
    pub fn for_policy(policy: &RetentionPolicy) -> Self {
        if policy.archive {
            Self::Archive
        } else {
            Self::Delete
        }
    }
}

/// Outcome of classifying one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Survivors, most recent first.
    pub keep: Vec<RetentionCandidate>,
    /// Stale files plus fresh files beyond `retain_count`, in path order.
    pub reject: Vec<RetentionCandidate>,
}

/// Newer first; equal modification times fall back to lexicographic path
/// order.
pub fn recency_order(a: &RetentionCandidate, b: &RetentionCandidate) -> Ordering {
    b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path))
}

/// Split `candidates` into survivors and rejects under `policy` at `now`.
///
/// A file is fresh when its age is at most `max_age`. Of the fresh files the
/// `retain_count` most recent survive; `retain_count == 0` keeps every fresh
/// file.
pub fn classify(
    candidates: Vec<RetentionCandidate>,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> RetentionPlan {
    let (mut fresh, mut reject): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|candidate| policy.max_age.is_fresh(candidate.modified, now));

    fresh.sort_by(recency_order);
    if policy.retain_count > 0 && fresh.len() > policy.retain_count {
        reject.extend(fresh.split_off(policy.retain_count));
    }
    reject.sort_by(|a, b| a.path.cmp(&b.path));

    RetentionPlan { keep: fresh, reject }
}
