//! Command-line arguments

use std::path::PathBuf;

use anyhow::bail;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, ValueEnum};
use dsr_domain::constants::WINDOW_INPUT_FORMAT;
use dsr_domain::{previous_day_bounds, ReportFormat};
use dsr_infra::config::SmtpSettings;

/// How notifications leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmailMethod {
    /// SMTP relay (`--smtp-*` flags or `[mail.smtp]` settings)
    Smtp,
    /// Gmail REST API with OAuth refresh-token credentials
    GmailApi,
    /// Write `.eml` files to the spool directory
    Spool,
}

#[derive(Debug, Parser)]
#[command(name = "dsr", version, about = "Daily status reports from issue-tracker activity")]
pub struct Cli {
    /// Directory holding conf/, reports/ and logs/
    #[arg(long, default_value = ".")]
    pub base_path: PathBuf,

    /// Single project descriptor to run (default: every descriptor in conf/)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Window start, `YYYY-MM-DD HH:MM` (default: yesterday 00:00)
    #[arg(long, value_parser = parse_window_bound)]
    pub start_date: Option<NaiveDateTime>,

    /// Window end, `YYYY-MM-DD HH:MM` (default: yesterday 23:59)
    #[arg(long, value_parser = parse_window_bound)]
    pub end_date: Option<NaiveDateTime>,

    /// Report format: tabular (csv) or document (html)
    #[arg(long, default_value = "document")]
    pub report: ReportFormat,

    /// Attach the report file to each notification
    #[arg(long)]
    pub attach: bool,

    #[arg(long, value_enum, default_value_t = EmailMethod::Smtp)]
    pub email_method: EmailMethod,

    /// SMTP relay host [default: localhost]
    #[arg(long)]
    pub smtp_server: Option<String>,

    /// SMTP relay port [default: 25]
    #[arg(long)]
    pub smtp_port: Option<u16>,

    /// Use STARTTLS on the SMTP connection
    #[arg(long)]
    pub smtp_tls: bool,

    #[arg(long)]
    pub smtp_user: Option<String>,

    #[arg(long)]
    pub smtp_passwd: Option<String>,

    /// Send the run summary to this address
    #[arg(long, value_name = "EMAIL")]
    pub summary: Option<String>,

    /// Validate project configuration and exit
    #[arg(long)]
    pub validate: bool,

    /// Also log to the terminal
    #[arg(long)]
    pub interactive: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Accept invalid TLS certificates from trackers
    #[arg(long)]
    pub ssl_silent: bool,
}

impl Cli {
    /// Window bounds, falling back to the whole of the day before `today`.
    ///
    /// # Errors
    /// Fails when the start is after the end.
    pub fn window_bounds(&self, today: NaiveDate) -> anyhow::Result<(String, String)> {
        let (default_start, default_end) = previous_day_bounds(today);
        let start = match self.start_date {
            Some(start) => start,
            None => parse_window_bound(&default_start).map_err(anyhow::Error::msg)?,
        };
        let end = match self.end_date {
            Some(end) => end,
            None => parse_window_bound(&default_end).map_err(anyhow::Error::msg)?,
        };
        if start > end {
            bail!(
                "start date {} is after end date {}",
                start.format(WINDOW_INPUT_FORMAT),
                end.format(WINDOW_INPUT_FORMAT)
            );
        }
        Ok((start.format(WINDOW_INPUT_FORMAT).to_string(), end.format(WINDOW_INPUT_FORMAT).to_string()))
    }

    /// Command-line relay options take precedence over settings.
    pub fn apply_smtp_overrides(&self, smtp: &mut SmtpSettings) {
        if let Some(server) = &self.smtp_server {
            smtp.server = server.clone();
        }
        if let Some(port) = self.smtp_port {
            smtp.port = port;
        }
        smtp.tls |= self.smtp_tls;
        if let Some(user) = &self.smtp_user {
            smtp.user = Some(user.clone());
        }
        if let Some(password) = &self.smtp_passwd {
            smtp.password = Some(password.clone());
        }
    }
}

fn parse_window_bound(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), WINDOW_INPUT_FORMAT)
        .map_err(|err| format!("expected `YYYY-MM-DD HH:MM`, got {raw:?} ({err})"))
}
