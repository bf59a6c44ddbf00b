//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use dsr_domain::DsrError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DsrError);

impl From<InfraError> for DsrError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DsrError> for InfraError {
    fn from(value: DsrError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDsrError {
    fn into_dsr(self) -> DsrError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DsrError */
/* -------------------------------------------------------------------------- */

impl IntoDsrError for HttpError {
    fn into_dsr(self) -> DsrError {
        if self.is_timeout() {
            return DsrError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DsrError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status);
        }

        if self.is_decode() {
            return DsrError::InvalidInput(format!("malformed HTTP response body: {self}"));
        }

        DsrError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_dsr())
    }
}

/// Map a non-success HTTP status onto the domain taxonomy.
pub fn status_error(status: reqwest::StatusCode) -> DsrError {
    let code = status.as_u16();
    let message = format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

    match code {
        401 | 403 => DsrError::Auth(message),
        404 => DsrError::NotFound(message),
        429 => DsrError::Network(message),
        400..=499 => DsrError::InvalidInput(message),
        _ => DsrError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → DsrError */
/* -------------------------------------------------------------------------- */

impl IntoDsrError for IoError {
    fn into_dsr(self) -> DsrError {
        match self.kind() {
            ErrorKind::NotFound => DsrError::NotFound(self.to_string()),
            _ => DsrError::Io(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_dsr())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → DsrError */
/* -------------------------------------------------------------------------- */

impl IntoDsrError for JsonError {
    fn into_dsr(self) -> DsrError {
        DsrError::InvalidInput(format!("invalid JSON payload: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_dsr())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → DsrError */
/* -------------------------------------------------------------------------- */

impl IntoDsrError for toml::de::Error {
    fn into_dsr(self) -> DsrError {
        DsrError::Config(format!("invalid TOML: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_dsr())
    }
}

/// Shorthand for `InfraError::from(err).into()`.
pub fn to_dsr<E>(err: E) -> DsrError
where
    InfraError: From<E>,
{
    InfraError::from(err).into()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
