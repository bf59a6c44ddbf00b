//! SMTP relay transport
//!
//! Connects to the configured relay for each message, optionally upgrades
//! with STARTTLS and authenticates, then submits the composed MIME message
//! as is.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dsr_core::{MailTransport, OutboundMessage};
use dsr_domain::Result;
use lettre::address::Envelope;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, info};

use super::errors::MailError;
use super::mime::compose;
use crate::config::SmtpSettings;

pub struct SmtpTransport {
    relay: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpTransport {
    /// # Errors
    /// Fails when STARTTLS is requested for a host name that cannot be used
    /// for certificate verification, or when only one of user and password
    /// is set.
    pub fn new(settings: &SmtpSettings, from: impl Into<String>, timeout: Duration) -> std::result::Result<Self, MailError> {
        let builder = if settings.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server).map_err(MailError::from)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.server)
        };
        let mut builder = builder.port(settings.port).timeout(Some(timeout));

        match (&settings.user, &settings.password) {
            (Some(user), Some(password)) => {
                builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
            }
            (None, None) => {}
            _ => return Err(MailError::MissingCredentials("smtp user and password must be set together".into())),
        }

        debug!(server = %settings.server, port = settings.port, tls = settings.tls, "SMTP relay configured");
        Ok(Self { relay: builder.build(), from: from.into() })
    }

    fn envelope(&self, message: &OutboundMessage) -> std::result::Result<Envelope, MailError> {
        let from = mailbox_address(&self.from)?;
        let recipients = message.recipients().into_iter().map(mailbox_address).collect::<std::result::Result<Vec<_>, _>>()?;
        Envelope::new(Some(from), recipients).map_err(|_| MailError::NoRecipients)
    }

    async fn submit(&self, message: &OutboundMessage) -> std::result::Result<(), MailError> {
        let raw = compose(&self.from, message, Utc::now())?;
        let envelope = self.envelope(message)?;
        let response = self.relay.send_raw(&envelope, raw.as_bytes()).await?;
        debug!(code = %response.code(), "relay accepted message");
        Ok(())
    }
}

fn mailbox_address(raw: &str) -> std::result::Result<Address, MailError> {
    raw.trim()
        .parse::<Mailbox>()
        .map(|mailbox| mailbox.email)
        .map_err(|err| MailError::InvalidAddress(format!("{raw}: {err}")))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        self.submit(message).await?;
        info!(subject = %message.subject, recipients = message.recipients().len(), "message relayed over SMTP");
        Ok(())
    }
}
