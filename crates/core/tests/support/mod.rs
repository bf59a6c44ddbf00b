//! Shared test helpers for `dsr-core` integration tests.
//!
//! These helpers provide in-memory implementations of the core ports so that
//! aggregation and run tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod sinks;
pub mod tracker;

use chrono::{DateTime, FixedOffset, TimeZone};
use dsr_domain::{ActivityRecord, Comment, TimeLog, Transition, WorkItem};

/// UTC timestamp on 2024-01-01.
pub fn jan1(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .and_then(|utc| utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).single())
        .expect("valid timestamp")
}

pub fn work_item(id: &str) -> WorkItem {
    WorkItem {
        id: id.to_string(),
        project_id: "ABC".to_string(),
        title: format!("Title of {id}"),
        priority: "Major".to_string(),
        assignee: Some("Ada".to_string()),
        status: "In Progress".to_string(),
        estimated_seconds: 7200,
        spent_seconds: 5400,
    }
}

pub fn time_log(author: &str, seconds: u64, at: DateTime<FixedOffset>) -> ActivityRecord {
    TimeLog {
        author: author.to_string(),
        author_email: Some(format!("{}@example.com", author.to_lowercase())),
        timestamp: at,
        seconds,
        comment: format!("{author} worked {seconds}s"),
    }
    .into()
}

pub fn comment(author: &str, body: &str, at: DateTime<FixedOffset>) -> ActivityRecord {
    Comment { author: author.to_string(), timestamp: at, body: body.to_string() }.into()
}

pub fn transition(author: &str, from: &str, to: &str, at: DateTime<FixedOffset>) -> ActivityRecord {
    Transition {
        author: author.to_string(),
        timestamp: at,
        field: "status".to_string(),
        from_status: from.to_string(),
        to_status: to.to_string(),
    }
    .into()
}
