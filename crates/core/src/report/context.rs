use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use dsr_domain::constants::{PUBLISH_DATE_FORMAT, PUBLISH_TIME_FORMAT};
use dsr_domain::{normalize, DsrError, Result, Window, WorkItem};

use crate::activity::{ContributorLedger, ProjectActivitySet};

/// Publish instant expressed in the project's timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishStamp {
    at: DateTime<Tz>,
}

impl PublishStamp {
    pub fn new(now: DateTime<Utc>, zone: Tz) -> Self {
        Self { at: normalize(&now, &zone) }
    }

    pub fn at(&self) -> &DateTime<Tz> {
        &self.at
    }

    /// `01-Jan-2024`
    pub fn date_label(&self) -> String {
        self.at.format(PUBLISH_DATE_FORMAT).to_string()
    }

    /// `09:30:00 IST`
    pub fn time_label(&self) -> String {
        self.at.format(PUBLISH_TIME_FORMAT).to_string()
    }

    /// Timezone abbreviation, e.g. `IST`.
    pub fn zone_label(&self) -> String {
        self.at.format("%Z").to_string()
    }

    /// ISO 8601 with offset.
    pub fn iso(&self) -> String {
        self.at.to_rfc3339()
    }
}

/// Everything a renderer needs for one contributor of one project.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub project: &'a str,
    pub contributor: &'a str,
    pub window: &'a Window,
    pub publish: &'a PublishStamp,
    pub activity: &'a ProjectActivitySet,
}

impl<'a> ReportContext<'a> {
    /// The contributor's ledgers paired with their work items.
    ///
    /// # Errors
    /// Returns `DsrError::Render` if a ledger refers to an unknown item.
    pub fn rows(&self) -> Result<Vec<(&'a WorkItem, &'a ContributorLedger)>> {
        let activity = self.activity;
        activity
            .ledgers_for(self.contributor)
            .iter()
            .map(|ledger| {
                activity.item(ledger.item_id()).map(|item| (item, ledger)).ok_or_else(|| {
                    DsrError::Render(format!(
                        "ledger for {} refers to unknown item {}",
                        self.contributor,
                        ledger.item_id()
                    ))
                })
            })
            .collect()
    }
}
