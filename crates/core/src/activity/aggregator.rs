//! Project-wide activity aggregation
//!
//! Enumerates the items touched in a window, fetches their raw activity and
//! folds it into per-contributor ledgers. Item fetches run with bounded
//! concurrency but results are folded in source order, so repeated runs over
//! identical responses produce identical ledgers.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use dsr_domain::constants::DEFAULT_FETCH_CONCURRENCY;
use dsr_domain::{ActivityRecord, Attributed, DsrError, Result, Window, WorkItem};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::ledger::ContributorLedger;
use super::ports::ActivitySource;

/// Contributor to ledgers mapping for one project, plus the items the
/// ledgers refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectActivitySet {
    items: BTreeMap<String, WorkItem>,
    contributors: BTreeMap<String, Vec<ContributorLedger>>,
}

impl ProjectActivitySet {
    /// Contributors in name order.
    pub fn contributors(&self) -> impl Iterator<Item = (&str, &[ContributorLedger])> {
        self.contributors.iter().map(|(name, ledgers)| (name.as_str(), ledgers.as_slice()))
    }

    pub fn ledgers_for(&self, contributor: &str) -> &[ContributorLedger] {
        self.contributors.get(contributor).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn item(&self, item_id: &str) -> Option<&WorkItem> {
        self.items.get(item_id)
    }

    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    pub(crate) fn absorb(&mut self, item: WorkItem, ledgers: Vec<ContributorLedger>) {
        if ledgers.is_empty() {
            return;
        }
        for ledger in ledgers {
            self.contributors.entry(ledger.author().to_string()).or_default().push(ledger);
        }
        self.items.insert(item.id.clone(), item);
    }
}

/// Result of aggregating one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectActivity {
    /// No contributor had any activity inside the window.
    Empty,
    Populated(ProjectActivitySet),
}

impl ProjectActivity {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Fold the raw records of one item into ledgers, one per author with at
/// least one admitted record. Ledgers are ordered by the author's first
/// admitted record.
pub fn fold_item(window: &Window, item_id: &str, records: &[ActivityRecord]) -> Vec<ContributorLedger> {
    let mut ledgers: Vec<ContributorLedger> = Vec::new();

    for record in records {
        if !ContributorLedger::admits(window, record) {
            continue;
        }

        let index = match ledgers.iter().position(|ledger| ledger.author() == record.author()) {
            Some(index) => index,
            None => {
                ledgers.push(ContributorLedger::new(item_id, record.author()));
                ledgers.len() - 1
            }
        };
        ledgers[index].fold(window, record);
    }

    ledgers
}

/// Drives an [`ActivitySource`] across all items of a project.
pub struct ProjectAggregator {
    source: Arc<dyn ActivitySource>,
    concurrency: usize,
}

impl ProjectAggregator {
    pub fn new(source: Arc<dyn ActivitySource>) -> Self {
        Self { source, concurrency: DEFAULT_FETCH_CONCURRENCY }
    }

    /// Maximum number of items fetched at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Aggregate the activity of `project_id` inside `window`.
    ///
    /// # Errors
    /// Fails only when the changed-items query fails. Per-item failures are
    /// logged and the item is excluded.
    #[instrument(skip(self, window), fields(start = %window.start_label(), end = %window.end_label()))]
    pub async fn aggregate(&self, project_id: &str, window: &Window) -> Result<ProjectActivity> {
        let found = self.source.find_changed_items(project_id, window).await?;
        let item_ids = unique_in_order(found);
        info!(items = item_ids.len(), "found changed work items");

        if item_ids.is_empty() {
            return Ok(ProjectActivity::Empty);
        }

        let fetched: Vec<(String, Result<(WorkItem, Vec<ActivityRecord>)>)> = stream::iter(item_ids)
            .map(|item_id| async move {
                let outcome = self.fetch_item(&item_id, window).await;
                (item_id, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut set = ProjectActivitySet::default();
        let mut skipped = 0usize;

        for (item_id, outcome) in fetched {
            match outcome {
                Ok((item, records)) => {
                    let ledgers = fold_item(window, &item_id, &records);
                    debug!(
                        item_id = %item_id,
                        records = records.len(),
                        contributors = ledgers.len(),
                        "folded work item activity"
                    );
                    set.absorb(item, ledgers);
                }
                Err(err) => {
                    skipped += 1;
                    warn!(item_id = %item_id, error = %err, "skipping work item after fetch failure");
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "excluded work items from aggregation");
        }

        if set.is_empty() {
            info!("no in-window activity for project");
            return Ok(ProjectActivity::Empty);
        }

        info!(contributors = set.contributor_count(), "aggregated project activity");
        Ok(ProjectActivity::Populated(set))
    }

    async fn fetch_item(&self, item_id: &str, window: &Window) -> Result<(WorkItem, Vec<ActivityRecord>)> {
        let item = self.source.load_item(item_id).await.map_err(|err| as_item_error(item_id, err))?;
        let records = self
            .source
            .load_activity(item_id, window)
            .await
            .map_err(|err| as_item_error(item_id, err))?;
        Ok((item, records))
    }
}

/// Paged searches can return an item twice when it is updated mid-scan.
fn unique_in_order(item_ids: Vec<String>) -> Vec<String> {
    let total = item_ids.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<String> = item_ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
    if unique.len() < total {
        debug!(duplicates = total - unique.len(), "dropped repeated work item ids");
    }
    unique
}

fn as_item_error(item_id: &str, err: DsrError) -> DsrError {
    match err {
        DsrError::ActivitySource { .. } => err,
        other => DsrError::activity_source(item_id, other),
    }
}
