//! Activity aggregation: ledgers, project aggregator and tracker ports

pub mod aggregator;
pub mod ledger;
pub mod ports;

pub use aggregator::{fold_item, ProjectActivity, ProjectActivitySet, ProjectAggregator};
pub use ledger::ContributorLedger;
pub use ports::{ActivitySource, ActivitySourceProvider};
