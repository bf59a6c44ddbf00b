//! Jira integration
//!
//! Implements the tracker ports on top of the Jira REST API v2:
//!
//! - `GET /rest/api/2/project/{key}`: project display name
//! - `GET /rest/api/2/search`: items created or updated in the window (paged)
//! - `GET /rest/api/2/issue/{id}`: item fields and the changelog
//! - `GET /rest/api/2/issue/{id}/worklog` and `/comment`: activity entries
//!
//! Requests use HTTP basic auth and go through [`HttpClient`](crate::http::HttpClient),
//! so server errors and connection failures are retried with backoff.
pub mod client;
mod types;

pub use client::{changed_items_jql, JiraActivitySource, JiraSourceProvider};
