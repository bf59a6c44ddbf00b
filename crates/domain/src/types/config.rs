//! Project descriptors and run parameters consumed by the pipeline

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::impl_keyword_conversions;

/// Code-review backend attached to a project descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    Fisheye,
    Stash,
}

impl_keyword_conversions!(SourceType {
    Fisheye => "fisheye",
    Stash => "stash",
});

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated rows, one per work item.
    Tabular,
    /// HTML narrative document.
    #[default]
    Document,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tabular => "csv",
            Self::Document => "html",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Tabular => "text/csv",
            Self::Document => "text/html",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tabular => write!(f, "tabular"),
            Self::Document => write!(f, "document"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tabular" | "csv" => Ok(Self::Tabular),
            "document" | "html" => Ok(Self::Document),
            _ => Err(format!("Invalid ReportFormat: {s}")),
        }
    }
}

/// Username/password pair. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("user", &self.user).field("password", &"***").finish()
    }
}

/// Code-review source linked to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub source_type: SourceType,
    pub url: String,
    pub credentials: Credentials,
    pub repo: String,
}

/// A validated project descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub key: String,
    pub managers: Vec<String>,
    pub server_url: String,
    pub credentials: Credentials,
    pub timezone: Tz,
    pub source: SourceConfig,
}

impl ProjectConfig {
    /// Identity used for duplicate detection: project key plus server.
    pub fn identity(&self) -> (String, String) {
        (self.key.to_uppercase(), self.server_url.trim_end_matches('/').to_lowercase())
    }
}

/// Parameters of one pipeline run shared by every project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParameters {
    /// Timezone-naive `YYYY-MM-DD HH:MM`, localized per project.
    pub start_date: String,
    /// Timezone-naive `YYYY-MM-DD HH:MM`, localized per project.
    pub end_date: String,
    pub report_format: ReportFormat,
    pub attach_report: bool,
}
