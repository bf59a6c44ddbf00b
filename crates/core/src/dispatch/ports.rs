//! Port interface for outbound mail

use async_trait::async_trait;
use dsr_domain::Result;

/// File attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), data }
    }
}

/// A fully addressed HTML message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub html_body: String,
    pub attachment: Option<Attachment>,
}

impl OutboundMessage {
    /// Every distinct recipient, `to` first.
    pub fn recipients(&self) -> Vec<&str> {
        let mut all: Vec<&str> = Vec::new();
        for address in self.to.iter().chain(self.cc.iter()) {
            if !all.iter().any(|seen| seen.eq_ignore_ascii_case(address)) {
                all.push(address);
            }
        }
        all
    }
}

/// Delivers messages. Implementations must bound every network call with a
/// timeout.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}
