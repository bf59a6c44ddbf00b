//! Configuration loading
//!
//! Project descriptors and application settings from the `conf/` directory.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    discover_projects, load_project, load_projects, load_settings, AppSettings, GmailSettings,
    HttpSettings, MailSettings, RetentionSettings, SmtpSettings,
};
