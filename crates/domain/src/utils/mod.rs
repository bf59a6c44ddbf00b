//! Pure helper functions shared across layers

pub mod time;

pub use time::{format_seconds, localize, normalize, parse_source_timestamp};
