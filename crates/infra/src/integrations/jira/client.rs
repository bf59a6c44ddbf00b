/// Jira REST client implementing the activity source port
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dsr_core::{ActivitySource, ActivitySourceProvider};
use dsr_domain::{
    parse_source_timestamp, ActivityRecord, Comment, Credentials, DsrError, ProjectConfig, Result, TimeLog,
    Transition, Window, WorkItem,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::types::{
    ChangelogEnvelope, CommentEntry, CommentPage, HistoryEntry, IssuePayload, ProjectPayload, SearchPage,
    UserRef, WorklogEntry, WorklogPage,
};
use crate::http::HttpClient;

const API_PREFIX: &str = "/rest/api/2";
const DEFAULT_PAGE_SIZE: u32 = 50;
const ISSUE_FIELDS: &str = "summary,priority,assignee,status,timeoriginalestimate,timeestimate,timespent,project";

/// Build the search query selecting items created or updated in the window.
pub fn changed_items_jql(project_key: &str, window: &Window) -> String {
    let start = window.start_label();
    let end = window.end_label();
    format!(
        "project={project_key} AND ((created >= \"{start}\" and created <= \"{end}\") \
         OR (updated >= \"{start}\" and updated <= \"{end}\")) order by updated asc"
    )
}

/// Activity source backed by one Jira server.
pub struct JiraActivitySource {
    http: HttpClient,
    base_url: String,
    auth_header: String,
    page_size: u32,
}

impl JiraActivitySource {
    /// Create a client for `base_url` authenticating with HTTP basic auth.
    pub fn new(http: HttpClient, base_url: impl Into<String>, credentials: &Credentials) -> Self {
        let token = STANDARD.encode(format!("{}:{}", credentials.user, credentials.password));
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_header: format!("Basic {token}"),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the search page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let builder = self
            .http
            .request(Method::GET, self.endpoint(path))
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
            .query(query);
        self.http.send_json(builder).await
    }

    async fn load_time_logs(&self, item_id: &str) -> Result<Vec<ActivityRecord>> {
        let page: WorklogPage = self.get_json(&format!("/issue/{item_id}/worklog"), &[]).await?;
        Ok(decode_entries(item_id, "worklog", page.worklogs, time_log_from_entry))
    }

    async fn load_comments(&self, item_id: &str) -> Result<Vec<ActivityRecord>> {
        let query = [("maxResults", "1000".to_string())];
        let page: CommentPage = self.get_json(&format!("/issue/{item_id}/comment"), &query).await?;
        Ok(decode_entries(item_id, "comment", page.comments, comment_from_entry))
    }

    async fn load_transitions(&self, item_id: &str) -> Result<Vec<ActivityRecord>> {
        let query = [("expand", "changelog".to_string()), ("fields", "status".to_string())];
        let envelope: ChangelogEnvelope = self.get_json(&format!("/issue/{item_id}"), &query).await?;
        let histories = envelope.changelog.unwrap_or_default().histories;

        let mut records = Vec::new();
        for history in decode_entries(item_id, "changelog", histories, Ok::<HistoryEntry, DsrError>) {
            match transitions_from_history(history) {
                Ok(transitions) => records.extend(transitions.into_iter().map(ActivityRecord::from)),
                Err(err) => warn!(item = item_id, error = %err, "skipping malformed changelog entry"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl ActivitySource for JiraActivitySource {
    #[instrument(skip(self))]
    async fn project_name(&self, project_key: &str) -> Result<String> {
        let project: ProjectPayload = self.get_json(&format!("/project/{project_key}"), &[]).await?;
        Ok(project.name)
    }

    #[instrument(skip(self, window))]
    async fn find_changed_items(&self, project_id: &str, window: &Window) -> Result<Vec<String>> {
        let jql = changed_items_jql(project_id, window);
        debug!(%jql, "searching changed items");

        let mut keys = Vec::new();
        let mut start_at = 0u32;
        loop {
            let query = [
                ("jql", jql.clone()),
                ("startAt", start_at.to_string()),
                ("maxResults", self.page_size.to_string()),
                ("fields", "key".to_string()),
            ];
            let page: SearchPage = self.get_json("/search", &query).await?;
            let fetched = page.issues.len() as u32;
            keys.extend(page.issues.into_iter().map(|issue| issue.key));

            // the echoed startAt is not trusted; some servers ignore the parameter
            start_at += fetched;
            if fetched == 0 || start_at >= page.total {
                break;
            }
        }

        debug!(count = keys.len(), "changed items found");
        Ok(keys)
    }

    #[instrument(skip(self))]
    async fn load_item(&self, item_id: &str) -> Result<WorkItem> {
        let query = [("fields", ISSUE_FIELDS.to_string())];
        let issue: IssuePayload = self.get_json(&format!("/issue/{item_id}"), &query).await?;
        let fields = issue.fields;

        Ok(WorkItem {
            project_id: fields.project.map(|project| project.key).unwrap_or_default(),
            id: issue.key,
            title: fields.summary,
            priority: fields.priority.map(|p| p.name).unwrap_or_default(),
            assignee: fields.assignee.map(|user| user.display_name),
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            estimated_seconds: fields.timeestimate.unwrap_or(0),
            spent_seconds: fields.timespent.unwrap_or(0),
        })
    }

    #[instrument(skip(self, _window))]
    async fn load_activity(&self, item_id: &str, _window: &Window) -> Result<Vec<ActivityRecord>> {
        let fetch = async {
            let mut records = self.load_time_logs(item_id).await?;
            records.extend(self.load_comments(item_id).await?);
            records.extend(self.load_transitions(item_id).await?);
            Ok::<_, DsrError>(records)
        };
        fetch.await.map_err(|err| DsrError::activity_source(item_id, err))
    }
}

/// Decode raw entries one by one, dropping the ones that do not parse.
fn decode_entries<E, T, F>(item_id: &str, kind: &str, raw: Vec<Value>, convert: F) -> Vec<T>
where
    E: DeserializeOwned,
    F: Fn(E) -> Result<T>,
{
    raw.into_iter()
        .filter_map(|value| {
            let decoded = serde_json::from_value::<E>(value)
                .map_err(|e| DsrError::InvalidInput(e.to_string()))
                .and_then(&convert);
            match decoded {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(item = item_id, kind, error = %err, "skipping malformed activity entry");
                    None
                }
            }
        })
        .collect()
}

fn require_author(update_author: Option<UserRef>, author: Option<UserRef>) -> Result<UserRef> {
    update_author.or(author).ok_or_else(|| DsrError::InvalidInput("entry has no author".into()))
}

fn time_log_from_entry(entry: WorklogEntry) -> Result<ActivityRecord> {
    let author = require_author(entry.update_author, entry.author)?;
    Ok(TimeLog {
        author: author.display_name,
        author_email: author.email_address.filter(|email| !email.is_empty()),
        timestamp: parse_source_timestamp(&entry.updated)?,
        seconds: entry.time_spent_seconds,
        comment: entry.comment,
    }
    .into())
}

fn comment_from_entry(entry: CommentEntry) -> Result<ActivityRecord> {
    let author = require_author(entry.update_author, entry.author)?;
    Ok(Comment {
        author: author.display_name,
        timestamp: parse_source_timestamp(&entry.updated)?,
        body: entry.body,
    }
    .into())
}

fn transitions_from_history(history: HistoryEntry) -> Result<Vec<Transition>> {
    let author = history.author.ok_or_else(|| DsrError::InvalidInput("changelog entry has no author".into()))?;
    let timestamp = parse_source_timestamp(&history.created)?;

    Ok(history
        .items
        .into_iter()
        .map(|item| Transition {
            author: author.display_name.clone(),
            timestamp,
            field: item.field,
            from_status: item.from_value.unwrap_or_default(),
            to_status: item.to_value.unwrap_or_default(),
        })
        .collect())
}

/// Opens [`JiraActivitySource`]s for project descriptors.
#[derive(Debug, Clone)]
pub struct JiraSourceProvider {
    timeout: Duration,
    max_attempts: usize,
    accept_invalid_certs: bool,
}

impl JiraSourceProvider {
    pub fn new(timeout: Duration, max_attempts: usize, accept_invalid_certs: bool) -> Self {
        Self { timeout, max_attempts, accept_invalid_certs }
    }
}

impl Default for JiraSourceProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), 3, false)
    }
}

#[async_trait]
impl ActivitySourceProvider for JiraSourceProvider {
    async fn connect(&self, project: &ProjectConfig) -> Result<Arc<dyn ActivitySource>> {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .max_attempts(self.max_attempts)
            .accept_invalid_certs(self.accept_invalid_certs)
            .build()?;
        debug!(project = %project.key, server = %project.server_url, "connecting to tracker");
        Ok(Arc::new(JiraActivitySource::new(http, project.server_url.clone(), &project.credentials)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn source(server: &MockServer) -> JiraActivitySource {
        let http = HttpClient::builder().max_attempts(1).build().expect("http client");
        JiraActivitySource::new(http, format!("{}/", server.uri()), &Credentials::new("bot", "secret"))
    }

    fn window() -> Window {
        Window::parse("2024-01-01 00:00", "2024-01-01 23:59", "UTC").expect("window")
    }

    #[test]
    fn jql_covers_created_and_updated() {
        let jql = changed_items_jql("ABC", &window());
        assert_eq!(
            jql,
            "project=ABC AND ((created >= \"2024-01-01 00:00\" and created <= \"2024-01-01 23:59\") \
             OR (updated >= \"2024-01-01 00:00\" and updated <= \"2024-01-01 23:59\")) order by updated asc"
        );
    }

    #[tokio::test]
    async fn project_name_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project/ABC"))
            .and(header("authorization", "Basic Ym90OnNlY3JldA=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "ABC", "name": "Apollo"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project/NOPE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = source(&server);
        assert_eq!(source.project_name("ABC").await.expect("name"), "Apollo");
        assert!(matches!(source.project_name("NOPE").await, Err(DsrError::NotFound(_))));
    }

    #[tokio::test]
    async fn search_follows_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 2, "total": 3,
                "issues": [{"key": "ABC-1"}, {"key": "ABC-2"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 2, "maxResults": 2, "total": 3,
                "issues": [{"key": "ABC-3"}]
            })))
            .mount(&server)
            .await;

        let keys = source(&server).with_page_size(2).find_changed_items("ABC", &window()).await.expect("keys");
        assert_eq!(keys, vec!["ABC-1", "ABC-2", "ABC-3"]);
    }

    #[tokio::test]
    async fn search_advances_even_when_server_echoes_zero_offset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "total": 3,
                "issues": [{"key": "ABC-1"}, {"key": "ABC-2"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "total": 3,
                "issues": [{"key": "ABC-3"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let keys = source(&server).with_page_size(2).find_changed_items("ABC", &window()).await.expect("keys");
        assert_eq!(keys, vec!["ABC-1", "ABC-2", "ABC-3"]);
    }

    #[tokio::test]
    async fn load_item_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/ABC-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "ABC-1",
                "fields": {
                    "summary": "Fix login",
                    "priority": {"name": "High"},
                    "assignee": null,
                    "status": {"name": "In Progress"},
                    "timeestimate": 7200,
                    "timespent": 3600,
                    "project": {"key": "ABC", "name": "Apollo"}
                }
            })))
            .mount(&server)
            .await;

        let item = source(&server).load_item("ABC-1").await.expect("item");
        assert_eq!(item.title, "Fix login");
        assert_eq!(item.project_id, "ABC");
        assert_eq!(item.assignee, None);
        assert_eq!(item.estimated_seconds, 7200);
        assert_eq!(item.spent_seconds, 3600);
    }

    #[tokio::test]
    async fn load_activity_collects_all_kinds_and_skips_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/ABC-1/worklog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"worklogs": [
                {
                    "updated": "2024-01-01T10:00:00.000+0000",
                    "updateAuthor": {"displayName": "Asha", "emailAddress": "asha@example.com"},
                    "timeSpentSeconds": 3600,
                    "comment": "wired the form"
                },
                {"updated": "garbage", "updateAuthor": {"displayName": "Asha"}, "timeSpentSeconds": 60}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/ABC-1/comment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"comments": [
                {"updated": "2024-01-01T11:00:00.000+0000", "author": {"displayName": "Ben"}, "body": "LGTM"}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/ABC-1"))
            .and(query_param("expand", "changelog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"changelog": {"histories": [
                {
                    "created": "2024-01-01T12:00:00.000+0000",
                    "author": {"displayName": "Asha"},
                    "items": [
                        {"field": "status", "fromString": "Open", "toString": "In Progress"},
                        {"field": "assignee", "fromString": null, "toString": "Asha"}
                    ]
                }
            ]}})))
            .mount(&server)
            .await;

        let records = source(&server).load_activity("ABC-1", &window()).await.expect("records");
        assert_eq!(records.len(), 4);
        match &records[0] {
            ActivityRecord::TimeLog(log) => {
                assert_eq!(log.author, "Asha");
                assert_eq!(log.author_email.as_deref(), Some("asha@example.com"));
                assert_eq!(log.seconds, 3600);
            }
            other => panic!("expected time log, got {other:?}"),
        }
        assert!(matches!(&records[1], ActivityRecord::Comment(c) if c.author == "Ben"));
        assert!(matches!(&records[2], ActivityRecord::Transition(t) if t.is_status_change()));
        assert!(matches!(&records[3], ActivityRecord::Transition(t) if !t.is_status_change()));
    }

    #[tokio::test]
    async fn load_activity_failure_names_the_item() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(401)).mount(&server).await;

        let err = source(&server).load_activity("ABC-9", &window()).await.unwrap_err();
        match err {
            DsrError::ActivitySource { item_id, .. } => assert_eq!(item_id, "ABC-9"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
