//! Report pipeline constants
//!
//! Centralized location for formats, directory names and defaults shared by
//! the domain, core and infrastructure layers.

// Wall-clock formats
pub const WINDOW_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const PUBLISH_DATE_FORMAT: &str = "%d-%b-%Y";
pub const PUBLISH_TIME_FORMAT: &str = "%H:%M:%S %Z";
pub const RUN_DATE_FORMAT: &str = "%d-%b-%Y";
pub const LOG_FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

// Workspace layout below the base path
pub const REPORTS_DIR: &str = "reports";
pub const LOGS_DIR: &str = "logs";
pub const CONF_DIR: &str = "conf";
pub const SETTINGS_FILE: &str = "dsr.toml";
pub const LOG_FILE_PREFIX: &str = "JIRA_DSR_Report_";

// Retention defaults
pub const DEFAULT_RETENTION_PERIOD: &str = "7d";
pub const REPORTS_RETENTION_PATTERN: &str = "reports/**/**/*";
pub const LOGS_RETENTION_PATTERN: &str = "*.log";
pub const ARCHIVE_EXTENSION: &str = "gz";

// Distribution
pub const DEFAULT_MAIL_FROM: &str = "dsr-report@localhost";
pub const REPORT_FILE_INFIX: &str = "_dsr-report-";

// Aggregation
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;
