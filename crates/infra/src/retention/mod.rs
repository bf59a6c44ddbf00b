//! Artifact retention
//!
//! Scans a directory tree for files matching a glob and deletes or archives
//! the ones the retention policy rejects.

pub mod pruner;

pub use pruner::{prune, PruneStats};
