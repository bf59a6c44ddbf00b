//! Error types used throughout the report pipeline

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the DSR pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DsrError {
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Retention root does not exist: {}", .0.display())]
    InvalidRetentionRoot(PathBuf),

    #[error("Invalid retention period: {0}")]
    InvalidRetentionPeriod(String),

    #[error("Activity source error for {item_id}: {cause}")]
    ActivitySource { item_id: String, cause: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DsrError {
    /// Stable label used as a structured log field.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidWindow(_) => "invalid_window",
            Self::InvalidRetentionRoot(_) => "invalid_retention_root",
            Self::InvalidRetentionPeriod(_) => "invalid_retention_period",
            Self::ActivitySource { .. } => "activity_source",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io(_) => "io",
            Self::Render(_) => "render",
            Self::Dispatch(_) => "dispatch",
            Self::Internal(_) => "internal",
        }
    }

    /// Wrap an arbitrary failure as a per-item activity source error.
    pub fn activity_source(item_id: impl Into<String>, cause: impl ToString) -> Self {
        Self::ActivitySource { item_id: item_id.into(), cause: cause.to_string() }
    }
}

/// Result type alias for DSR operations
pub type Result<T> = std::result::Result<T, DsrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_snake_case() {
        let err = DsrError::activity_source("ABC-1", "HTTP 500");
        assert_eq!(err.label(), "activity_source");
        assert_eq!(err.to_string(), "Activity source error for ABC-1: HTTP 500");
        assert_eq!(DsrError::InvalidRetentionRoot(PathBuf::from("/nope")).label(), "invalid_retention_root");
    }

    #[test]
    fn serializes_with_tag_and_content() {
        let json = serde_json::to_value(DsrError::Auth("HTTP 401 Unauthorized".into()))
            .expect("serialize");
        assert_eq!(json["type"], "Auth");
        assert_eq!(json["message"], "HTTP 401 Unauthorized");
    }
}
