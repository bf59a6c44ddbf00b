//! Per-run orchestration
//!
//! Drives every configured project through validation, aggregation,
//! rendering and dispatch. Each project's outcome lands in exactly one
//! [`RunSummary`] bucket; a failing project never aborts the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use dsr_domain::constants::DEFAULT_FETCH_CONCURRENCY;
use dsr_domain::{DsrError, ProjectConfig, Result, RunParameters, RunSummary, Window};
use tracing::{error, info, instrument, warn};

use super::clock::{Clock, SystemClock};
use crate::activity::{ActivitySource, ActivitySourceProvider, ProjectActivity, ProjectAggregator};
use crate::dispatch::{no_activity_message, report_message, Dispatcher, MailTransport};
use crate::report::{ArtifactStore, PublishStamp, ReportContext, ReportRenderer};

/// A project whose descriptor passed semantic validation.
#[derive(Clone)]
pub struct ValidatedProject {
    pub config: ProjectConfig,
    /// Display name resolved from the tracker.
    pub name: String,
    pub source: Arc<dyn ActivitySource>,
}

/// Terminal state of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectOutcome {
    Reported { contributors: usize },
    /// No in-window activity. `notice_error` is set when the managers could
    /// not be told.
    NoActivity { notice_error: Option<DsrError> },
}

/// Drop descriptors that repeat an earlier key and server pair.
pub fn dedupe_projects(projects: Vec<ProjectConfig>) -> Vec<ProjectConfig> {
    let mut seen = HashSet::new();
    projects
        .into_iter()
        .filter(|project| {
            let fresh = seen.insert(project.identity());
            if !fresh {
                warn!(project = %project.key, url = %project.server_url, "skipping duplicate project descriptor");
            }
            fresh
        })
        .collect()
}

/// Report pipeline service.
pub struct ReportRunService {
    sources: Arc<dyn ActivitySourceProvider>,
    renderer: ReportRenderer,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    concurrency: usize,
}

impl ReportRunService {
    pub fn new(
        sources: Arc<dyn ActivitySourceProvider>,
        store: Arc<dyn ArtifactStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            sources,
            renderer: ReportRenderer::new(store),
            dispatcher: Dispatcher::new(transport),
            clock: Arc::new(SystemClock),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Maximum concurrent item fetches within one project.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Connect to each project's tracker and resolve its key.
    ///
    /// Projects that fail are recorded in `summary.validation` and excluded.
    pub async fn validate(
        &self,
        projects: Vec<ProjectConfig>,
        summary: &mut RunSummary,
    ) -> Vec<ValidatedProject> {
        let mut validated = Vec::with_capacity(projects.len());

        for config in dedupe_projects(projects) {
            match self.validate_project(&config).await {
                Ok((name, source)) => {
                    info!(project = %config.key, name = %name, "project configuration validated");
                    validated.push(ValidatedProject { config, name, source });
                }
                Err(err) => {
                    error!(project = %config.key, error = %err, kind = err.label(), "project validation failed");
                    summary.record_validation(format!("{}: {err}", config.key));
                }
            }
        }

        validated
    }

    /// Validate then process every project, recording outcomes in
    /// `summary`.
    pub async fn run(&self, projects: Vec<ProjectConfig>, params: &RunParameters, summary: &mut RunSummary) {
        let validated = self.validate(projects, summary).await;

        for project in &validated {
            let started = Instant::now();
            match self.run_project(project, params).await {
                Ok(ProjectOutcome::Reported { contributors }) => {
                    summary.record_success(project.config.key.clone());
                    info!(
                        project = %project.config.key,
                        contributors,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "project reports generated"
                    );
                }
                Ok(ProjectOutcome::NoActivity { notice_error }) => {
                    summary.record_noreport(project.config.key.clone());
                    info!(project = %project.config.key, "project had no activity in window");
                    if let Some(err) = notice_error {
                        error!(project = %project.config.key, error = %err, kind = err.label(), "no-activity notice not sent");
                        summary.record_failed(project.config.key.clone());
                    }
                }
                Err(err) => {
                    error!(project = %project.config.key, error = %err, kind = err.label(), "project processing failed");
                    summary.record_failed(project.config.key.clone());
                }
            }
        }
    }

    /// Aggregate, render and dispatch one validated project.
    ///
    /// # Errors
    /// Any error is fatal to this project only.
    #[instrument(skip(self, project, params), fields(project = %project.config.key))]
    pub async fn run_project(&self, project: &ValidatedProject, params: &RunParameters) -> Result<ProjectOutcome> {
        let config = &project.config;
        let window = Window::parse(&params.start_date, &params.end_date, config.timezone.name())?;
        info!(
            start = %window.start_label(),
            end = %window.end_label(),
            zone = %config.timezone.name(),
            "aggregating project activity"
        );

        let aggregator = ProjectAggregator::new(project.source.clone()).with_concurrency(self.concurrency);
        let activity = aggregator.aggregate(&config.key, &window).await?;
        let publish = PublishStamp::new(self.clock.now(), config.timezone);

        let set = match activity {
            ProjectActivity::Empty => {
                let notice = match no_activity_message(&project.name, &config.managers, &window, &publish) {
                    Ok(message) => self.dispatcher.dispatch(&message).await,
                    Err(err) => Err(err),
                };
                return Ok(ProjectOutcome::NoActivity { notice_error: notice.err() });
            }
            ProjectActivity::Populated(set) => set,
        };

        for (contributor, ledgers) in set.contributors() {
            let ctx = ReportContext {
                project: &project.name,
                contributor,
                window: &window,
                publish: &publish,
                activity: &set,
            };
            let report = self.renderer.render(params.report_format, &ctx).await?;
            let email = ledgers.iter().find_map(|ledger| ledger.author_email());
            let message = report_message(
                &project.name,
                contributor,
                email,
                &config.managers,
                &publish,
                &report,
                params.attach_report,
            )?;
            self.dispatcher.dispatch(&message).await?;
        }

        Ok(ProjectOutcome::Reported { contributors: set.contributor_count() })
    }

    async fn validate_project(&self, config: &ProjectConfig) -> Result<(String, Arc<dyn ActivitySource>)> {
        if config.managers.is_empty() {
            return Err(DsrError::Validation(format!("project {} has no manager addresses", config.key)));
        }
        let source = self.sources.connect(config).await?;
        let name = source.project_name(&config.key).await?;
        Ok((name, source))
    }
}
