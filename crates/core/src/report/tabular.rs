//! Comma-separated report rendering
//!
//! One header row followed by one row per work item the contributor touched.
//! Fields are quoted when they contain a delimiter, a quote or a line break;
//! list-valued columns are encoded as JSON arrays.

use dsr_domain::{format_seconds, Result};

use super::context::ReportContext;

/// Fixed positional header row.
pub const HEADERS: [&str; 13] = [
    "PUBLISH_DATETIME",
    "JIRA-ID",
    "TITLE",
    "PRIORITY",
    "ASSIGNEE",
    "STATUS",
    "TRANSITIONS",
    "ESTIMATED TIME",
    "TOTAL TIME SPENT",
    "WORK USER",
    "WORK TIME",
    "WORK LOG",
    "COMMENTS",
];

const LINE_END: &str = "\r\n";

/// Render the contributor's ledgers as CSV.
///
/// # Errors
/// Returns `DsrError::Render` if a ledger refers to an unknown work item.
pub fn render(ctx: &ReportContext<'_>) -> Result<String> {
    let published = ctx.publish.iso();
    let mut out = String::new();
    push_row(&mut out, HEADERS.iter().map(|header| header.to_string()));

    for (item, ledger) in ctx.rows()? {
        push_row(
            &mut out,
            [
                published.clone(),
                item.id.clone(),
                item.title.clone(),
                item.priority.clone(),
                item.assignee_label().to_string(),
                item.status.clone(),
                ledger.transition_labels().join(", "),
                format_seconds(item.estimated_seconds),
                format_seconds(item.spent_seconds),
                ctx.contributor.to_string(),
                ledger.total_seconds().to_string(),
                json_list(ledger.work_log_comments()),
                json_list(ledger.comments()),
            ],
        );
    }

    Ok(out)
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let row: Vec<String> = fields.into_iter().map(|field| quote(&field)).collect();
    out.push_str(&row.join(","));
    out.push_str(LINE_END);
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}
