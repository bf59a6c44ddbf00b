//! Timezone-qualified reporting window

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::constants::WINDOW_INPUT_FORMAT;
use crate::errors::{DsrError, Result};
use crate::utils::time::{localize, normalize};

/// Inclusive `[start, end]` interval expressed in a fixed timezone.
///
/// Immutable once constructed; `start <= end` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    zone: Tz,
}

impl Window {
    /// Build a window from two instants, re-expressed in `zone`.
    ///
    /// # Errors
    /// Returns `DsrError::InvalidWindow` if `start > end`.
    pub fn new<A: TimeZone, B: TimeZone>(
        start: &DateTime<A>,
        end: &DateTime<B>,
        zone: Tz,
    ) -> Result<Self> {
        let start = normalize(start, &zone);
        let end = normalize(end, &zone);
        if start > end {
            return Err(DsrError::InvalidWindow(format!(
                "start {} is after end {}",
                start.format(WINDOW_INPUT_FORMAT),
                end.format(WINDOW_INPUT_FORMAT)
            )));
        }
        Ok(Self { start, end, zone })
    }

    /// Parse two `YYYY-MM-DD HH:MM` wall-clock strings and localize them in
    /// the IANA zone `zone_name`.
    ///
    /// # Errors
    /// Returns `DsrError::InvalidWindow` if either bound is malformed, the
    /// zone is unknown, a bound falls in a DST gap, or `start > end`.
    pub fn parse(start: &str, end: &str, zone_name: &str) -> Result<Self> {
        let zone: Tz = zone_name
            .parse()
            .map_err(|_| DsrError::InvalidWindow(format!("unknown timezone '{zone_name}'")))?;
        let start = localize(&parse_wall_clock(start)?, &zone)?;
        let end = localize(&parse_wall_clock(end)?, &zone)?;
        Self::new(&start, &end, zone)
    }

    /// True iff `timestamp`, expressed in this window's zone, lies in
    /// `[start, end]`.
    pub fn contains<T: TimeZone>(&self, timestamp: &DateTime<T>) -> bool {
        let local = normalize(timestamp, &self.zone);
        self.start <= local && local <= self.end
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Start bound rendered as `YYYY-MM-DD HH:MM`.
    pub fn start_label(&self) -> String {
        self.start.format(WINDOW_INPUT_FORMAT).to_string()
    }

    /// End bound rendered as `YYYY-MM-DD HH:MM`.
    pub fn end_label(&self) -> String {
        self.end.format(WINDOW_INPUT_FORMAT).to_string()
    }
}

/// Wall-clock bounds covering the whole of the day before `today`
/// (`00:00` to `23:59`), formatted for [`Window::parse`].
pub fn previous_day_bounds(today: NaiveDate) -> (String, String) {
    let day = today - Duration::days(1);
    let start = day.and_time(NaiveTime::MIN);
    let end = day.and_hms_opt(23, 59, 0).unwrap_or(start);
    (
        start.format(WINDOW_INPUT_FORMAT).to_string(),
        end.format(WINDOW_INPUT_FORMAT).to_string(),
    )
}

fn parse_wall_clock(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), WINDOW_INPUT_FORMAT).map_err(|err| {
        DsrError::InvalidWindow(format!("'{raw}' is not in {WINDOW_INPUT_FORMAT} format: {err}"))
    })
}
