//! Outbound mail transports
//!
//! - [`SpoolTransport`]: writes `.eml` files to a local directory
//! - [`GmailTransport`]: Gmail REST API with OAuth refresh-token auth
//! - [`SmtpTransport`]: SMTP relay, optionally with STARTTLS and login

pub mod errors;
pub mod gmail;
pub mod mime;
pub mod smtp;
pub mod spool;

pub use errors::MailError;
pub use gmail::{AccessTokenProvider, GmailTransport, RefreshTokenProvider};
pub use smtp::SmtpTransport;
pub use spool::SpoolTransport;
