//! # DSR Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Configuration loading (project descriptors, settings)
//! - HTTP client with retry and backoff
//! - Jira REST integration
//! - Filesystem artifact storage
//! - Mail transports (SMTP relay, spool directory, Gmail API)
//! - Retention pruning
//! - Logging setup
//!
//! ## Architecture
//! - Implements traits defined in `dsr-core`
//! - Depends on `dsr-domain` and `dsr-core`
//! - Contains all "impure" code (filesystem, network)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod mail;
pub mod observability;
pub mod retention;
pub mod storage;

// Re-export commonly used items
pub use config::{load_projects, load_settings, AppSettings};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, RetryPolicy};
pub use integrations::jira::{JiraActivitySource, JiraSourceProvider};
pub use mail::{GmailTransport, MailError, SmtpTransport, SpoolTransport};
pub use observability::{init_logging, LoggingHandle, LoggingOptions};
pub use retention::{prune, PruneStats};
pub use storage::FsArtifactStore;
