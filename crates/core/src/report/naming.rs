//! Deterministic artifact locations

use std::path::PathBuf;

use dsr_domain::constants::{REPORTS_DIR, REPORT_FILE_INFIX};
use dsr_domain::ReportFormat;

/// `reports/{project}/{publish_date}/{project}_dsr-report-{contributor}_{publish_date}.{ext}`
///
/// Re-running on the same publish date yields the same path. Path
/// separators inside names are replaced with `_`.
pub fn artifact_path(
    project: &str,
    contributor: &str,
    publish_date: &str,
    format: ReportFormat,
) -> PathBuf {
    let project = sanitize(project);
    let contributor = sanitize(contributor);
    let publish_date = sanitize(publish_date);
    let file_name = format!(
        "{project}{REPORT_FILE_INFIX}{contributor}_{publish_date}.{}",
        format.extension()
    );

    PathBuf::from(REPORTS_DIR).join(&project).join(&publish_date).join(file_name)
}

fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
