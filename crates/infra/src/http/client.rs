use std::time::Duration;

use chrono::Utc;
use dsr_domain::DsrError;
use reqwest::{Client as ReqwestClient, IntoUrl, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::retry::{retry_after, RetryPolicy};
use crate::errors::{status_error, to_dsr};

/// Shared HTTP client for the tracker and mail APIs.
///
/// Transient statuses and connection failures are retried according to a
/// [`RetryPolicy`]. Request bodies must be buffered so they can be replayed.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Execute `builder`, retrying transient failures. The last response is
    /// returned as is once attempts run out, whatever its status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, DsrError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut retry = 0usize;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| DsrError::Internal("streaming request bodies cannot be retried".into()))?
                .build()
                .map_err(to_dsr)?;
            let url = request.url().clone();
            let last = retry + 1 >= attempts;

            match self.client.execute(request).await {
                Ok(response) if !last && RetryPolicy::is_transient(response.status()) => {
                    retry += 1;
                    let delay = self.policy.delay(retry, retry_after(response.headers(), Utc::now()));
                    warn!(%url, status = %response.status(), retry, delay_ms = delay.as_millis() as u64, "transient HTTP status");
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    debug!(%url, status = %response.status(), "HTTP response");
                    return Ok(response);
                }
                Err(err) if !last && RetryPolicy::is_transient_error(&err) => {
                    retry += 1;
                    let delay = self.policy.delay(retry, None);
                    warn!(%url, error = %err, retry, delay_ms = delay.as_millis() as u64, "HTTP request failed");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(to_dsr(err)),
            }
        }
    }

    /// Send, require a success status and decode the JSON body.
    pub async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T, DsrError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        response.json::<T>().await.map_err(to_dsr)
    }
}

#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    policy: RetryPolicy,
    accept_invalid_certs: bool,
}

impl HttpClientBuilder {
    /// Per-request timeout, 30 seconds unless set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Total attempts per request, first try included.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.policy.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.policy.base_backoff = backoff;
        self
    }

    /// Upper bound for any single wait, `Retry-After` included.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Skip TLS certificate verification (`--ssl-silent`).
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, DsrError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .user_agent(concat!("dsr/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(to_dsr)?;
        Ok(HttpClient { client, policy: self.policy })
    }
}
