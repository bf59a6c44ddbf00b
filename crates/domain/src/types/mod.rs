//! Domain types and models

pub mod activity;
pub mod config;
pub mod retention;
pub mod summary;
pub mod window;
pub mod work_item;

pub use activity::{ActivityRecord, Attributed, Comment, TimeLog, Transition, STATUS_FIELD};
pub use config::{Credentials, ProjectConfig, ReportFormat, RunParameters, SourceConfig, SourceType};
pub use retention::{PeriodUnit, RetentionCandidate, RetentionPeriod, RetentionPolicy};
pub use summary::RunSummary;
pub use window::{previous_day_bounds, Window};
pub use work_item::WorkItem;
