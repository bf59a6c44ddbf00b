//! Distribution of rendered reports and notices

pub mod messages;
pub mod ports;

use std::sync::Arc;

use dsr_domain::Result;
use tracing::{info, instrument};

pub use messages::{no_activity_message, report_message, run_summary_message};
pub use ports::{Attachment, MailTransport, OutboundMessage};

/// Hands composed messages to the configured transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    #[instrument(skip(self, message), fields(subject = %message.subject))]
    pub async fn dispatch(&self, message: &OutboundMessage) -> Result<()> {
        self.transport.send(message).await?;
        info!(
            to = %message.to.join(","),
            cc = %message.cc.join(","),
            attachment = message.attachment.is_some(),
            "dispatched message"
        );
        Ok(())
    }
}
