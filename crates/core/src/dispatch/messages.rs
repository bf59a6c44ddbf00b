//! Composition of the three notification shapes
//!
//! - per-contributor report, cc to the project managers
//! - project-level "no activity" notice, managers only
//! - end-of-run summary with the log file attached

use dsr_domain::{DsrError, Result, RunSummary, Window};
use tracing::warn;

use super::ports::{Attachment, OutboundMessage};
use crate::report::document::escape;
use crate::report::{PublishStamp, RenderedReport};

/// Per-contributor report notification.
///
/// The rendered report is the body. Without a known contributor address the
/// report goes to the managers only.
///
/// # Errors
/// Returns `DsrError::Dispatch` when there is nobody to address.
pub fn report_message(
    project: &str,
    contributor: &str,
    contributor_email: Option<&str>,
    managers: &[String],
    publish: &PublishStamp,
    report: &RenderedReport,
    attach: bool,
) -> Result<OutboundMessage> {
    let to = match contributor_email.map(str::trim).filter(|email| !email.is_empty()) {
        Some(email) => vec![email.to_string()],
        None => {
            warn!(project, contributor, "no email known for contributor; sending to managers only");
            managers.to_vec()
        }
    };
    ensure_addressed(&to, project)?;

    let attachment = attach.then(|| {
        Attachment::new(report.file_name(), report.format.mime_type(), report.content.clone().into_bytes())
    });

    Ok(OutboundMessage {
        subject: format!("{project} DSR Report {} | {contributor}", publish.date_label()),
        to,
        cc: managers.to_vec(),
        html_body: report.content.clone(),
        attachment,
    })
}

/// Notice sent to the managers when a project had no in-window activity.
///
/// # Errors
/// Returns `DsrError::Dispatch` when the manager list is empty.
pub fn no_activity_message(
    project: &str,
    managers: &[String],
    window: &Window,
    publish: &PublishStamp,
) -> Result<OutboundMessage> {
    ensure_addressed(managers, project)?;
    let zone = publish.zone_label();

    Ok(OutboundMessage {
        subject: format!("No DSR Report for {project} on {}", publish.date_label()),
        to: managers.to_vec(),
        cc: managers.to_vec(),
        html_body: format!(
            "<b>There is no worklog activity present on JIRA Project: [{}] for DSR report \
             between dates [{} {zone}] - [{} {zone}]</b>",
            escape(project),
            window.start_label(),
            window.end_label(),
        ),
        attachment: None,
    })
}

/// End-of-run summary listing the non-empty outcome buckets.
pub fn run_summary_message(
    summary: &RunSummary,
    start_date: &str,
    end_date: &str,
    run_date: &str,
    recipient: &str,
    log_file: Option<Attachment>,
) -> OutboundMessage {
    let mut body = format!(
        "<h3>Report date range: [{}] - [{}]</h3>",
        escape(start_date),
        escape(end_date)
    );

    for (label, entries) in summary.sections() {
        if entries.is_empty() {
            continue;
        }
        body.push_str(&format!("<ul><h4>{label}:</h4>"));
        for entry in entries {
            body.push_str(&format!("<li>{}</li>", escape(entry)));
        }
        body.push_str("</ul>");
    }

    if log_file.is_some() {
        body.push_str("<b>Attachment is the log file generated for this run.</b>");
    }

    OutboundMessage {
        subject: format!("JIRA DSR Report | Daily Run Summary Report | {run_date}"),
        to: vec![recipient.to_string()],
        cc: vec![recipient.to_string()],
        html_body: body,
        attachment: log_file,
    }
}

fn ensure_addressed(recipients: &[String], project: &str) -> Result<()> {
    if recipients.iter().any(|address| !address.trim().is_empty()) {
        Ok(())
    } else {
        Err(DsrError::Dispatch(format!("no recipients configured for project {project}")))
    }
}
