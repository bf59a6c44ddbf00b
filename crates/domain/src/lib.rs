//! # DSR Domain
//!
//! Business domain types for the daily status report pipeline.
//!
//! This crate contains:
//! - Reporting window and timestamp normalization
//! - Work items and the activity record union
//! - Project descriptors, run parameters and the run summary
//! - Retention policy model
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other DSR crates
//! - No I/O; pure data and conversions

pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
pub use utils::time::{format_seconds, normalize, parse_source_timestamp};
