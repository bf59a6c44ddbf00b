//! Spool transport
//!
//! Writes each message as an `.eml` file for a local relay (or a human) to
//! pick up. Used when no mail API is configured.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use dsr_core::{MailTransport, OutboundMessage};
use dsr_domain::Result;
use tracing::info;

use super::errors::MailError;
use super::mime::compose;

pub struct SpoolTransport {
    dir: PathBuf,
    from: String,
}

impl SpoolTransport {
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>) -> Self {
        Self { dir: dir.into(), from: from.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn spool(&self, message: &OutboundMessage) -> std::result::Result<PathBuf, MailError> {
        let now = Utc::now();
        let raw = compose(&self.from, message, now)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}_{}.eml", now.format("%Y%m%d%H%M%S"), uuid::Uuid::new_v4().simple());
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, raw.as_bytes()).await?;
        Ok(path)
    }
}

#[async_trait]
impl MailTransport for SpoolTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let path = self.spool(message).await?;
        info!(path = %path.display(), subject = %message.subject, recipients = message.recipients().len(), "message spooled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn writes_one_eml_per_message() {
        let dir = TempDir::new().expect("temp dir");
        let transport = SpoolTransport::new(dir.path().join("outbox"), "dsr@example.com");
        let message = OutboundMessage {
            subject: "No DSR Report for Apollo on 01-Jan-2024".into(),
            to: vec!["lead@example.com".into()],
            cc: Vec::new(),
            html_body: "<p>nothing</p>".into(),
            attachment: None,
        };

        transport.send(&message).await.expect("send");
        transport.send(&message).await.expect("send again");

        let files: Vec<_> = std::fs::read_dir(transport.dir()).expect("outbox").filter_map(|e| e.ok()).collect();
        assert_eq!(files.len(), 2);
        let raw = std::fs::read_to_string(files[0].path()).expect("read");
        assert!(raw.contains("To: lead@example.com\r\n"));
    }

    #[tokio::test]
    async fn refuses_message_without_recipients() {
        let dir = TempDir::new().expect("temp dir");
        let transport = SpoolTransport::new(dir.path(), "dsr@example.com");
        let message = OutboundMessage {
            subject: "s".into(),
            to: Vec::new(),
            cc: Vec::new(),
            html_body: String::new(),
            attachment: None,
        };

        let err = transport.send(&message).await.unwrap_err();
        assert!(matches!(err, dsr_domain::DsrError::Dispatch(_)));
    }
}
