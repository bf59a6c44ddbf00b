//! Retention policy model
//!
//! A policy is a maximum age, a count of fresh files to keep and a choice
//! between deleting or archiving everything else. Periods are written as an
//! integer followed by a unit, e.g. `7d`, `2w`, `3 months`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RETENTION_PERIOD;
use crate::errors::DsrError;

static PERIOD_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\d+)\s*([a-z]+)\s*$").ok());

/// Calendar unit of a retention period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl PeriodUnit {
    fn parse(raw: &str) -> Option<Self> {
        let unit = match raw.to_ascii_lowercase().as_str() {
            "y" | "year" | "years" => Self::Years,
            "m" | "month" | "months" => Self::Months,
            "w" | "week" | "weeks" => Self::Weeks,
            "d" | "day" | "days" => Self::Days,
            "h" | "hour" | "hours" => Self::Hours,
            "i" | "min" | "mins" | "minute" | "minutes" => Self::Minutes,
            "s" | "sec" | "secs" | "second" | "seconds" => Self::Seconds,
            _ => return None,
        };
        Some(unit)
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Years => "y",
            Self::Months => "m",
            Self::Weeks => "w",
            Self::Days => "d",
            Self::Hours => "h",
            Self::Minutes => "i",
            Self::Seconds => "s",
        }
    }
}

/// Maximum age of an artifact before it becomes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RetentionPeriod {
    magnitude: u32,
    unit: PeriodUnit,
}

impl RetentionPeriod {
    pub fn new(magnitude: u32, unit: PeriodUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// Oldest modification time still considered fresh at `now`.
    ///
    /// Months and years are calendar-aware. A cutoff that would fall before
    /// the representable range clamps to the minimum instant.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let magnitude = i64::from(self.magnitude);
        let shifted = match self.unit {
            PeriodUnit::Years => now.checked_sub_months(Months::new(self.magnitude.saturating_mul(12))),
            PeriodUnit::Months => now.checked_sub_months(Months::new(self.magnitude)),
            PeriodUnit::Weeks => now.checked_sub_signed(Duration::weeks(magnitude)),
            PeriodUnit::Days => now.checked_sub_signed(Duration::days(magnitude)),
            PeriodUnit::Hours => now.checked_sub_signed(Duration::hours(magnitude)),
            PeriodUnit::Minutes => now.checked_sub_signed(Duration::minutes(magnitude)),
            PeriodUnit::Seconds => now.checked_sub_signed(Duration::seconds(magnitude)),
        };
        shifted.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// True iff a file modified at `modified` has age `<= self` at `now`.
    pub fn is_fresh(&self, modified: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        modified >= self.cutoff(now)
    }
}

impl Default for RetentionPeriod {
    fn default() -> Self {
        Self::new(7, PeriodUnit::Days)
    }
}

impl FromStr for RetentionPeriod {
    type Err = DsrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || DsrError::InvalidRetentionPeriod(raw.to_string());
        let pattern = PERIOD_PATTERN.as_ref().ok_or_else(invalid)?;
        let captures = pattern.captures(raw).ok_or_else(invalid)?;
        let magnitude = captures[1].parse::<u32>().map_err(|_| invalid())?;
        let unit = PeriodUnit::parse(&captures[2]).ok_or_else(invalid)?;
        Ok(Self { magnitude, unit })
    }
}

impl TryFrom<String> for RetentionPeriod {
    type Error = DsrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RetentionPeriod> for String {
    fn from(value: RetentionPeriod) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RetentionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

fn default_max_age() -> RetentionPeriod {
    DEFAULT_RETENTION_PERIOD.parse().unwrap_or_default()
}

/// How a directory of artifacts is pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Fresh files kept, most recent first. `0` keeps every fresh file.
    #[serde(default)]
    pub retain_count: usize,
    #[serde(default = "default_max_age")]
    pub max_age: RetentionPeriod,
    /// Compress rejected files instead of deleting them.
    #[serde(default)]
    pub archive: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { retain_count: 0, max_age: default_max_age(), archive: false }
    }
}

/// A file considered during one retention scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionCandidate {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

impl RetentionCandidate {
    pub fn new(path: impl Into<PathBuf>, modified: DateTime<Utc>) -> Self {
        Self { path: path.into(), modified }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_letters_and_words() {
        assert_eq!("7d".parse::<RetentionPeriod>().unwrap(), RetentionPeriod::new(7, PeriodUnit::Days));
        assert_eq!("2W".parse::<RetentionPeriod>().unwrap(), RetentionPeriod::new(2, PeriodUnit::Weeks));
        assert_eq!("30i".parse::<RetentionPeriod>().unwrap(), RetentionPeriod::new(30, PeriodUnit::Minutes));
        assert_eq!("3 months".parse::<RetentionPeriod>().unwrap(), RetentionPeriod::new(3, PeriodUnit::Months));
        assert_eq!("1 year".parse::<RetentionPeriod>().unwrap(), RetentionPeriod::new(1, PeriodUnit::Years));
    }

    #[test]
    fn rejects_malformed_periods() {
        for raw in ["", "d7", "7", "7 fortnights", "-1d", "seven days"] {
            let err = raw.parse::<RetentionPeriod>().unwrap_err();
            assert!(matches!(err, DsrError::InvalidRetentionPeriod(_)), "{raw}");
        }
    }

    #[test]
    fn months_are_calendar_aware() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let cutoff = RetentionPeriod::new(1, PeriodUnit::Months).cutoff(now);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
    }

    #[test]
    fn age_equal_to_max_is_fresh() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let period = RetentionPeriod::new(7, PeriodUnit::Days);
        assert!(period.is_fresh(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), now));
        assert!(!period.is_fresh(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap(), now));
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: RetentionPolicy = serde_json::from_str(r#"{"max_age": "2w"}"#).unwrap();
        assert_eq!(policy.retain_count, 0);
        assert!(!policy.archive);
        assert_eq!(policy.max_age.to_string(), "2w");

        let policy: RetentionPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, RetentionPolicy::default());

        assert!(serde_json::from_str::<RetentionPolicy>(r#"{"max_age": "soon"}"#).is_err());
    }
}
