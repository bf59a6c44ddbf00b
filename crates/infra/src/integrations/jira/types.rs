/// Jira REST API v2 payloads
///
/// Only the fields the report consumes are modelled. Activity entries are
/// received as raw JSON values and decoded one by one so a malformed entry
/// can be skipped without losing the rest of the page.
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectPayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IssueRef {
    pub key: String,
}

/// One page of `/rest/api/2/search`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub issues: Vec<IssueRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserRef {
    pub display_name: String,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub priority: Option<Named>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default)]
    pub status: Option<Named>,
    /// Remaining estimate in seconds.
    #[serde(default)]
    pub timeestimate: Option<u64>,
    #[serde(default)]
    pub timespent: Option<u64>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IssuePayload {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorklogPage {
    #[serde(default)]
    pub worklogs: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorklogEntry {
    pub updated: String,
    #[serde(default)]
    pub update_author: Option<UserRef>,
    #[serde(default)]
    pub author: Option<UserRef>,
    pub time_spent_seconds: u64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentEntry {
    pub updated: String,
    #[serde(default)]
    pub update_author: Option<UserRef>,
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Changelog {
    #[serde(default)]
    pub histories: Vec<Value>,
}

/// `/rest/api/2/issue/{id}?expand=changelog`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChangelogEnvelope {
    #[serde(default)]
    pub changelog: Option<Changelog>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryItem {
    pub field: String,
    #[serde(default, rename = "fromString")]
    pub from_value: Option<String>,
    #[serde(default, rename = "toString")]
    pub to_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryEntry {
    pub created: String,
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub items: Vec<HistoryItem>,
}
