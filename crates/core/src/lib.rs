//! # DSR Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Contributor ledgers and the project aggregator
//! - Report renderers (tabular and document)
//! - Notification composition and the dispatcher
//! - Retention classification
//! - The run orchestration service
//! - Port interfaces (traits) for the tracker, artifact storage and mail
//!
//! ## Architecture Principles
//! - Only depends on `dsr-domain`
//! - No filesystem, HTTP, or platform code
//! - All external dependencies via traits

pub mod activity;
pub mod dispatch;
pub mod report;
pub mod retention;
pub mod run;

// Re-export specific items to avoid ambiguity
pub use activity::{
    ActivitySource, ActivitySourceProvider, ContributorLedger, ProjectActivity, ProjectActivitySet,
    ProjectAggregator,
};
pub use dispatch::{Attachment, Dispatcher, MailTransport, OutboundMessage};
pub use report::{ArtifactStore, PublishStamp, RenderedReport, ReportContext, ReportRenderer};
pub use retention::{classify, RetentionAction, RetentionPlan};
pub use run::{Clock, FixedClock, ProjectOutcome, ReportRunService, SystemClock, ValidatedProject};
