//! Observability
//!
//! Structured logging via `tracing`. Each run writes its own log file, which
//! is attached to the run summary notification.

pub mod logging;

pub use logging::{init_logging, log_file_name, LoggingHandle, LoggingOptions};
