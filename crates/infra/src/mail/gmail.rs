//! Gmail API transport
//!
//! Messages are composed locally and posted as base64url `raw` payloads to
//! `users/me/messages/send`. Access tokens come from an OAuth refresh token
//! and are cached until shortly before they expire.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::Utc;
use dsr_core::{MailTransport, OutboundMessage};
use dsr_domain::Result;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::errors::MailError;
use super::mime::compose;
use crate::config::GmailSettings;
use crate::http::HttpClient;

/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of OAuth bearer tokens for the mail API.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> std::result::Result<String, MailError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Exchanges a long-lived refresh token for access tokens.
pub struct RefreshTokenProvider {
    http: HttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshTokenProvider {
    /// # Errors
    /// Returns `MailError::MissingCredentials` if any credential is empty.
    pub fn new(http: HttpClient, settings: &GmailSettings) -> std::result::Result<Self, MailError> {
        let missing: Vec<&str> = [
            ("client_id", &settings.client_id),
            ("client_secret", &settings.client_secret),
            ("refresh_token", &settings.refresh_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(MailError::MissingCredentials(missing.join(", ")));
        }

        Ok(Self {
            http,
            token_url: settings.token_url.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            refresh_token: settings.refresh_token.clone(),
            cached: Mutex::new(None),
        })
    }

    async fn refresh(&self) -> std::result::Result<CachedToken, MailError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];
        let response = self.http.send(self.http.request(Method::POST, &self.token_url).form(&form)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Token(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }

        let token: TokenResponse = response.json().await.map_err(|e| MailError::Token(e.to_string()))?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        debug!(expires_in = lifetime.as_secs(), "access token refreshed");

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for RefreshTokenProvider {
    async fn access_token(&self) -> std::result::Result<String, MailError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.refresh().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}

/// Delivers messages through the Gmail REST API.
pub struct GmailTransport {
    http: HttpClient,
    api_base: String,
    from: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl GmailTransport {
    pub fn new(
        http: HttpClient,
        api_base: impl Into<String>,
        from: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            from: from.into(),
            tokens,
        }
    }

    /// Transport using the refresh-token flow described by `settings`.
    ///
    /// # Errors
    /// Returns `MailError::MissingCredentials` if the OAuth settings are
    /// incomplete.
    pub fn from_settings(
        http: HttpClient,
        settings: &GmailSettings,
        from: impl Into<String>,
    ) -> std::result::Result<Self, MailError> {
        let tokens = RefreshTokenProvider::new(http.clone(), settings)?;
        Ok(Self::new(http, settings.api_base.clone(), from, Arc::new(tokens)))
    }

    async fn deliver(&self, message: &OutboundMessage) -> std::result::Result<String, MailError> {
        let raw = compose(&self.from, message, Utc::now())?;
        let token = self.tokens.access_token().await?;

        let url = format!("{}/gmail/v1/users/me/messages/send", self.api_base);
        let builder = self
            .http
            .request(Method::POST, url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&json!({ "raw": URL_SAFE.encode(raw.as_bytes()) }));
        let response = self.http.send(builder).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api { status: status.as_u16(), message: body.trim().to_string() });
        }

        #[derive(Deserialize)]
        struct Sent {
            #[serde(default)]
            id: String,
        }
        let sent: Sent = response.json().await.map_err(|e| MailError::Api { status: status.as_u16(), message: e.to_string() })?;
        Ok(sent.id)
    }
}

#[async_trait]
impl MailTransport for GmailTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let id = self.deliver(message).await?;
        info!(message_id = %id, subject = %message.subject, recipients = message.recipients().len(), "message sent via Gmail API");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dsr_domain::DsrError;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn settings(server: &MockServer) -> GmailSettings {
        GmailSettings {
            client_id: "client".into(),
            client_secret: "secret".into(),
            refresh_token: "refresh".into(),
            token_url: format!("{}/token", server.uri()),
            api_base: server.uri(),
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            subject: "JIRA DSR Report | Daily Run Summary Report | 02-Jan-2024".into(),
            to: vec!["ops@example.com".into()],
            cc: Vec::new(),
            html_body: "<h3>summary</h3>".into(),
            attachment: None,
        }
    }

    fn http() -> HttpClient {
        HttpClient::builder().max_attempts(1).build().expect("http client")
    }

    #[tokio::test]
    async fn sends_raw_message_with_cached_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1", "expires_in": 3600})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_string_contains("\"raw\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg-1"})))
            .expect(2)
            .mount(&server)
            .await;

        let transport = GmailTransport::from_settings(http(), &settings(&server), "dsr@example.com").expect("transport");
        transport.send(&message()).await.expect("first send");
        transport.send(&message()).await.expect("second send");
    }

    #[tokio::test]
    async fn token_rejection_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let transport = GmailTransport::from_settings(http(), &settings(&server), "dsr@example.com").expect("transport");
        let err = transport.send(&message()).await.unwrap_err();
        assert!(matches!(err, DsrError::Auth(ref msg) if msg.contains("invalid_grant")), "{err}");
    }

    #[test]
    fn incomplete_settings_are_rejected() {
        let settings = GmailSettings { refresh_token: String::new(), ..GmailSettings::default() };
        let err = RefreshTokenProvider::new(http(), &settings).err().expect("missing credentials");
        assert!(matches!(err, MailError::MissingCredentials(ref names) if names.contains("refresh_token")));
    }
}
