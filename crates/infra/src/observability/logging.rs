//! Tracing subscriber setup
//!
//! A non-blocking file layer always writes to
//! `{log_dir}/JIRA_DSR_Report_{timestamp}.log`. A console layer on stderr is
//! added for interactive runs. `RUST_LOG` overrides the default directives.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use dsr_domain::constants::{LOG_FILE_PREFIX, LOG_FILE_TIMESTAMP_FORMAT};
use dsr_domain::{DsrError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_DIRECTIVES: &str = "info,hyper=warn,reqwest=warn,rustls=warn";
const VERBOSE_LOG_DIRECTIVES: &str = "debug,hyper=info,reqwest=info,rustls=info";

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub log_dir: PathBuf,
    /// Debug level instead of info.
    pub verbose: bool,
    /// Mirror log lines to stderr.
    pub interactive: bool,
}

/// Keeps the background writer alive; dropping it flushes the log file.
pub struct LoggingHandle {
    _guard: WorkerGuard,
    log_file: PathBuf,
}

impl LoggingHandle {
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// `JIRA_DSR_Report_{%Y-%m-%d_%H%M%S}.log`
pub fn log_file_name(started_at: DateTime<Local>) -> String {
    format!("{LOG_FILE_PREFIX}{}.log", started_at.format(LOG_FILE_TIMESTAMP_FORMAT))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `DsrError::Io` if the log directory cannot be created and
/// `DsrError::Internal` if a subscriber is already installed.
pub fn init_logging(options: &LoggingOptions) -> Result<LoggingHandle> {
    std::fs::create_dir_all(&options.log_dir)
        .map_err(|e| DsrError::Io(format!("cannot create log directory {}: {e}", options.log_dir.display())))?;

    let file_name = log_file_name(Local::now());
    let log_file = options.log_dir.join(&file_name);
    let appender = tracing_appender::rolling::never(&options.log_dir, &file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let default_directives = if options.verbose { VERBOSE_LOG_DIRECTIVES } else { DEFAULT_LOG_DIRECTIVES };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives))
        .map_err(|err| DsrError::Config(format!("invalid log directives: {err}")))?;

    let console = options.interactive.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true))
        .with(console)
        .try_init()
        .map_err(|err| DsrError::Internal(format!("logging already initialised: {err}")))?;

    Ok(LoggingHandle { _guard: guard, log_file })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn log_file_name_embeds_start_time() {
        let started = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(log_file_name(started), "JIRA_DSR_Report_2024-01-02_030405.log");
    }
}
