//! Run orchestration and clock abstraction

pub mod clock;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use service::{dedupe_projects, ProjectOutcome, ReportRunService, ValidatedProject};
