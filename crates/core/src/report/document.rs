//! HTML narrative report

use std::fmt::Write as _;

use dsr_domain::{format_seconds, Result};

use super::context::ReportContext;

/// Render the contributor's ledgers as a standalone HTML document.
///
/// # Errors
/// Returns `DsrError::Render` if a ledger refers to an unknown work item.
pub fn render(ctx: &ReportContext<'_>) -> Result<String> {
    let rows = ctx.rows()?;
    let zone = ctx.publish.zone_label();
    let total: u64 = rows.iter().map(|(_, ledger)| ledger.total_seconds()).sum();

    let mut body = String::new();
    for (item, ledger) in &rows {
        let _ = write!(
            body,
            "<tr><td>{id}</td><td>{title}</td><td>{priority}</td><td>{assignee}</td>\
             <td>{status}</td><td>{transitions}</td><td>{estimated}</td><td>{spent}</td>\
             <td>{logged}</td><td>{work_log}</td><td>{comments}</td></tr>\n",
            id = escape(&item.id),
            title = escape(&item.title),
            priority = escape(&item.priority),
            assignee = escape(item.assignee_label()),
            status = escape(&item.status),
            transitions = escape(&ledger.transition_labels().join(", ")),
            estimated = format_seconds(item.estimated_seconds),
            spent = format_seconds(item.spent_seconds),
            logged = format_seconds(ledger.total_seconds()),
            work_log = list(ledger.work_log_comments()),
            comments = list(ledger.comments()),
        );
    }

    Ok(format!(
        "<!DOCTYPE html>\n\
         <html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{project} DSR Report {date} | {contributor}</title>\n\
         <style>table{{border-collapse:collapse}}td,th{{border:1px solid #999;padding:4px;vertical-align:top}}</style>\n\
         </head>\n<body>\n\
         <h2>Daily Status Report: {project}</h2>\n\
         <p><b>User:</b> {contributor}<br>\n\
         <b>Activity between:</b> [{start} {zone}] - [{end} {zone}]<br>\n\
         <b>Published:</b> {date} {time}<br>\n\
         <b>Total time logged:</b> {total}</p>\n\
         <table>\n<tr><th>JIRA-ID</th><th>Title</th><th>Priority</th><th>Assignee</th><th>Status</th>\
         <th>Transitions</th><th>Estimated Time</th><th>Total Time Spent</th><th>Work Time</th>\
         <th>Work Log</th><th>Comments</th></tr>\n\
         {body}\
         </table>\n</body>\n</html>\n",
        project = escape(ctx.project),
        contributor = escape(ctx.contributor),
        date = ctx.publish.date_label(),
        time = ctx.publish.time_label(),
        start = ctx.window.start_label(),
        end = ctx.window.end_label(),
        zone = escape(&zone),
        total = format_seconds(total),
    ))
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let items: String = values.iter().map(|value| format!("<li>{}</li>", escape(value))).collect();
    format!("<ul>{items}</ul>")
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
