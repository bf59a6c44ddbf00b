//! Mail delivery errors

use dsr_domain::DsrError;
use thiserror::Error;

/// Errors raised while composing or delivering a message.
///
/// Callers outside this module receive [`DsrError`] via conversion.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("message has no recipients")]
    NoRecipients,

    /// CR or LF inside a header value.
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("missing mail credentials: {0}")]
    MissingCredentials(String),

    #[error("token refresh failed: {0}")]
    Token(String),

    #[error("mail API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid mail address {0}")]
    InvalidAddress(String),

    /// Failure reported by, or while talking to, an SMTP relay. `code` is
    /// the relay's reply code when one was received.
    #[error("SMTP relay error: {message}")]
    Smtp { code: Option<u16>, message: String },

    #[error("spool write failed: {0}")]
    Spool(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] DsrError),
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        let code = err.status().and_then(|code| code.to_string().parse::<u16>().ok());
        MailError::Smtp { code, message: err.to_string() }
    }
}

impl From<MailError> for DsrError {
    fn from(value: MailError) -> Self {
        match value {
            MailError::Transport(inner) => inner,
            other @ (MailError::MissingCredentials(_)
            | MailError::Token(_)
            | MailError::Api { status: 401 | 403, .. }
            | MailError::Smtp { code: Some(530 | 534 | 535), .. }) => DsrError::Auth(other.to_string()),
            other => DsrError::Dispatch(other.to_string()),
        }
    }
}
