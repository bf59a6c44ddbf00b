//! MIME message composition
//!
//! Every message is `multipart/mixed` with a base64 HTML part and an
//! optional base64 attachment part.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use dsr_core::OutboundMessage;

use super::errors::MailError;

const LINE_WIDTH: usize = 76;

/// Render `message` as an RFC 5322 message with CRLF line endings.
///
/// # Errors
/// Returns `MailError::NoRecipients` when `to` is empty and
/// `MailError::InvalidHeader` when a header value contains a line break.
pub fn compose(from: &str, message: &OutboundMessage, date: DateTime<Utc>) -> Result<String, MailError> {
    if message.to.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let boundary = format!("dsr-{}", uuid::Uuid::new_v4().simple());
    let mut out = String::new();

    push_header(&mut out, "From", from)?;
    push_header(&mut out, "To", &message.to.join(", "))?;
    if !message.cc.is_empty() {
        push_header(&mut out, "Cc", &message.cc.join(", "))?;
    }
    push_header(&mut out, "Subject", &encode_word(&message.subject))?;
    push_header(&mut out, "Date", &date.to_rfc2822())?;
    push_header(&mut out, "MIME-Version", "1.0")?;
    push_header(&mut out, "Content-Type", &format!("multipart/mixed; boundary=\"{boundary}\""))?;
    out.push_str("\r\n");

    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str("Content-Type: text/html; charset=\"utf-8\"\r\n");
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    push_base64(&mut out, message.html_body.as_bytes());

    if let Some(attachment) = &message.attachment {
        let file_name = attachment.file_name.replace(['"', '\r', '\n'], "_");
        out.push_str(&format!("--{boundary}\r\n"));
        out.push_str(&format!("Content-Type: {}; name=\"{file_name}\"\r\n", attachment.content_type));
        out.push_str(&format!("Content-Disposition: attachment; filename=\"{file_name}\"\r\n"));
        out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        push_base64(&mut out, &attachment.data);
    }

    out.push_str(&format!("--{boundary}--\r\n"));
    Ok(out)
}

fn push_header(out: &mut String, name: &'static str, value: &str) -> Result<(), MailError> {
    if value.contains(['\r', '\n']) {
        return Err(MailError::InvalidHeader(name));
    }
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
    Ok(())
}

/// RFC 2047 encoded word for non-ASCII header text.
fn encode_word(text: &str) -> String {
    if text.is_ascii() {
        text.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
    }
}

fn push_base64(out: &mut String, data: &[u8]) {
    let encoded = STANDARD.encode(data);
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
}
