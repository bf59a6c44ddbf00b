//! External service integrations

pub mod jira;
