//! Raw activity records attached to a work item
//!
//! The three record kinds share one capability: each belongs to an author
//! and occurred at an instant. [`Attributed`] exposes that capability so the
//! window filter never needs to inspect the concrete kind.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Field name carried by status transitions in the tracker's changelog.
pub const STATUS_FIELD: &str = "status";

/// Author and timestamp shared by every activity record.
pub trait Attributed {
    /// Display name of the author.
    fn author(&self) -> &str;

    /// Instant the record occurred, in whatever offset the source used.
    fn timestamp(&self) -> &DateTime<FixedOffset>;
}

/// Time logged against a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLog {
    pub author: String,
    pub author_email: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
    pub seconds: u64,
    pub comment: String,
}

/// Free-text comment on a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    pub body: String,
}

/// A single field change from the changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    pub field: String,
    pub from_status: String,
    pub to_status: String,
}

impl Transition {
    pub fn is_status_change(&self) -> bool {
        self.field.eq_ignore_ascii_case(STATUS_FIELD)
    }
}

/// Tagged union of the activity record kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityRecord {
    TimeLog(TimeLog),
    Comment(Comment),
    Transition(Transition),
}

macro_rules! impl_attributed {
    ($($ty:ty),+) => {
        $(impl Attributed for $ty {
            fn author(&self) -> &str {
                &self.author
            }

            fn timestamp(&self) -> &DateTime<FixedOffset> {
                &self.timestamp
            }
        })+
    };
}

impl_attributed!(TimeLog, Comment, Transition);

impl Attributed for ActivityRecord {
    fn author(&self) -> &str {
        match self {
            Self::TimeLog(log) => log.author(),
            Self::Comment(comment) => comment.author(),
            Self::Transition(transition) => transition.author(),
        }
    }

    fn timestamp(&self) -> &DateTime<FixedOffset> {
        match self {
            Self::TimeLog(log) => log.timestamp(),
            Self::Comment(comment) => comment.timestamp(),
            Self::Transition(transition) => transition.timestamp(),
        }
    }
}

impl From<TimeLog> for ActivityRecord {
    fn from(value: TimeLog) -> Self {
        Self::TimeLog(value)
    }
}

impl From<Comment> for ActivityRecord {
    fn from(value: Comment) -> Self {
        Self::Comment(value)
    }
}

impl From<Transition> for ActivityRecord {
    fn from(value: Transition) -> Self {
        Self::Transition(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn union_exposes_author_and_timestamp() {
        let at = FixedOffset::east_opt(3600).unwrap().with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let records: Vec<ActivityRecord> = vec![
            TimeLog {
                author: "Ada".into(),
                author_email: None,
                timestamp: at,
                seconds: 60,
                comment: String::new(),
            }
            .into(),
            Comment { author: "Bob".into(), timestamp: at, body: "hi".into() }.into(),
            Transition {
                author: "Cy".into(),
                timestamp: at,
                field: "Status".into(),
                from_status: "Open".into(),
                to_status: "Done".into(),
            }
            .into(),
        ];

        let authors: Vec<&str> = records.iter().map(Attributed::author).collect();
        assert_eq!(authors, vec!["Ada", "Bob", "Cy"]);
        assert!(records.iter().all(|record| *record.timestamp() == at));
    }

    #[test]
    fn status_field_match_is_case_insensitive() {
        let at = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut transition = Transition {
            author: "Ada".into(),
            timestamp: at,
            field: "Status".into(),
            from_status: "Open".into(),
            to_status: "In Progress".into(),
        };
        assert!(transition.is_status_change());
        transition.field = "assignee".into();
        assert!(!transition.is_status_change());
    }
}
