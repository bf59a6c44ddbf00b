//! Run orchestration for one invocation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use chrono::{Local, Utc};
use dsr_core::dispatch::run_summary_message;
use dsr_core::{Attachment, MailTransport, ReportRunService};
use dsr_domain::constants::{
    CONF_DIR, LOGS_DIR, LOGS_RETENTION_PATTERN, REPORTS_RETENTION_PATTERN, RUN_DATE_FORMAT, SETTINGS_FILE,
};
use dsr_domain::{ProjectConfig, RetentionPolicy, RunParameters, RunSummary};
use dsr_infra::config::{self, AppSettings};
use dsr_infra::{
    init_logging, prune, FsArtifactStore, GmailTransport, HttpClient, JiraSourceProvider, LoggingHandle,
    LoggingOptions, SmtpTransport, SpoolTransport,
};
use tracing::{error, info, warn};

use crate::args::{Cli, EmailMethod};

const SPOOL_DIR: &str = "outbox";

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let started = Instant::now();

    if !cli.base_path.is_dir() {
        bail!("base path {} is not an existing directory", cli.base_path.display());
    }
    let base = cli.base_path.canonicalize().context("cannot resolve base path")?;
    let (start_date, end_date) = cli.window_bounds(Local::now().date_naive())?;

    let logging = init_logging(&LoggingOptions {
        log_dir: base.join(LOGS_DIR),
        verbose: cli.verbose,
        interactive: cli.interactive,
    })?;
    info!(base = %base.display(), log_file = %logging.log_file().display(), "DSR run started");

    let mut summary = RunSummary::new();
    let mut settings = config::load_settings(&base).unwrap_or_else(|err| {
        error!(error = %err, kind = err.label(), "settings rejected, using defaults");
        summary.record_validation(format!("{SETTINGS_FILE}: {err}"));
        AppSettings::default()
    });
    cli.apply_smtp_overrides(&mut settings.mail.smtp);
    let projects = load_descriptors(&base, cli.config.as_deref(), &mut summary).unwrap_or_else(|err| {
        error!(error = %format!("{err:#}"), "no project descriptors loaded");
        summary.record_validation(format!("{CONF_DIR}: {err:#}"));
        Vec::new()
    });

    let timeout = Duration::from_secs(settings.http.timeout_secs);
    let sources = JiraSourceProvider::new(timeout, settings.http.max_attempts, cli.ssl_silent || settings.http.ssl_silent);

    // validation never sends mail
    let method = if cli.validate { EmailMethod::Spool } else { cli.email_method };
    let transport = build_transport(method, &settings, &base, timeout)?;

    let service = ReportRunService::new(Arc::new(sources), Arc::new(FsArtifactStore::new(&base)), transport)
        .with_concurrency(settings.http.fetch_concurrency);

    if cli.validate {
        let valid = service.validate(projects, &mut summary).await;
        for entry in &summary.validation {
            warn!(%entry, "invalid project configuration");
        }
        info!(valid = valid.len(), invalid = summary.validation.len(), "configuration validation finished");
        return Ok(());
    }

    let params = RunParameters {
        start_date: start_date.clone(),
        end_date: end_date.clone(),
        report_format: cli.report,
        attach_report: cli.attach,
    };
    info!(start = %start_date, end = %end_date, format = %cli.report, projects = projects.len(), "generating reports");
    service.run(projects, &params, &mut summary).await;

    if let Some(recipient) = cli.summary.as_deref() {
        let message = run_summary_message(
            &summary,
            &start_date,
            &end_date,
            &Local::now().format(RUN_DATE_FORMAT).to_string(),
            recipient,
            log_attachment(&logging),
        );
        match service.dispatcher().dispatch(&message).await {
            Ok(()) => info!(recipient, "run summary sent"),
            Err(err) => error!(recipient, error = %err, "failed to send run summary"),
        }
    }

    prune_artifacts(&base, &settings);

    info!(
        success = summary.success.len(),
        noreport = summary.noreport.len(),
        failed = summary.failed.len(),
        validation = summary.validation.len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "DSR run finished"
    );
    Ok(())
}

/// Load the selected descriptors. Descriptors that fail to load go to the
/// validation bucket; the run continues with the rest.
fn load_descriptors(base: &Path, single: Option<&Path>, summary: &mut RunSummary) -> anyhow::Result<Vec<ProjectConfig>> {
    let outcomes = match single {
        Some(file) => {
            let path = resolve_descriptor(base, file);
            let outcome = config::load_project(&path);
            vec![(path, outcome)]
        }
        None => config::load_projects(&base.join(CONF_DIR)).context("cannot read configuration directory")?,
    };

    let mut projects = Vec::with_capacity(outcomes.len());
    for (path, outcome) in outcomes {
        match outcome {
            Ok(project) => projects.push(project),
            Err(err) => {
                let name = path.file_stem().map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
                error!(descriptor = %path.display(), error = %err, kind = err.label(), "project descriptor rejected");
                summary.record_validation(format!("{name}: {err}"));
            }
        }
    }
    Ok(projects)
}

/// Relative descriptor paths are looked up under `conf/` when they do not
/// exist as given.
fn resolve_descriptor(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() || file.exists() {
        file.to_path_buf()
    } else {
        base.join(CONF_DIR).join(file)
    }
}

fn build_transport(
    method: EmailMethod,
    settings: &AppSettings,
    base: &Path,
    timeout: Duration,
) -> anyhow::Result<Arc<dyn MailTransport>> {
    match method {
        EmailMethod::Smtp => {
            let smtp = &settings.mail.smtp;
            let transport = SmtpTransport::new(smtp, settings.mail.from.clone(), timeout)
                .context("SMTP transport is not configured")?;
            info!(server = %smtp.server, port = smtp.port, tls = smtp.tls, "using SMTP mail transport");
            Ok(Arc::new(transport))
        }
        EmailMethod::Spool => {
            let dir = settings.mail.spool_dir.clone().unwrap_or_else(|| base.join(SPOOL_DIR));
            info!(dir = %dir.display(), "using spool mail transport");
            Ok(Arc::new(SpoolTransport::new(dir, settings.mail.from.clone())))
        }
        EmailMethod::GmailApi => {
            let http = HttpClient::builder().timeout(timeout).max_attempts(settings.http.max_attempts).build()?;
            let transport = GmailTransport::from_settings(http, &settings.mail.gmail, settings.mail.from.clone())
                .context("Gmail API transport is not configured")?;
            info!("using Gmail API mail transport");
            Ok(Arc::new(transport))
        }
    }
}

fn log_attachment(logging: &LoggingHandle) -> Option<Attachment> {
    let path = logging.log_file();
    match std::fs::read(path) {
        Ok(data) => {
            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            Some(Attachment::new(file_name, "text/plain", data))
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot attach log file");
            None
        }
    }
}

fn prune_artifacts(base: &Path, settings: &AppSettings) {
    let now = Utc::now();
    let passes: [(PathBuf, &str, &RetentionPolicy); 2] = [
        (base.to_path_buf(), REPORTS_RETENTION_PATTERN, &settings.retention.reports),
        (base.join(LOGS_DIR), LOGS_RETENTION_PATTERN, &settings.retention.logs),
    ];

    for (root, pattern, policy) in passes {
        if let Err(err) = prune(&root, pattern, policy, now) {
            error!(root = %root.display(), pattern, error = %err, "retention pass failed");
        }
    }
}
