//! Retry policy for tracker and mail API calls
//!
//! Jira and Google both answer with `429 Too Many Requests` under load and
//! attach a `Retry-After` header; reverse proxies in front of self-hosted
//! Jira report maintenance and restarts as 502/503/504. Those are retried.
//! Every other status is final, including 500, which Jira returns for
//! deterministic failures such as an unparseable JQL query.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

/// Attempts and delays for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_backoff: Duration::from_millis(250), max_delay: Duration::from_secs(30) }
    }
}

impl RetryPolicy {
    pub fn is_transient(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    }

    pub fn is_transient_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    /// Delay before retry number `retry` (1-based). A server-provided
    /// `Retry-After` wins over the exponential schedule; both are capped.
    pub fn delay(&self, retry: usize, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after.unwrap_or_else(|| {
            let shift = retry.saturating_sub(1).min(8) as u32;
            self.base_backoff.saturating_mul(1u32 << shift)
        });
        delay.min(self.max_delay)
    }
}

/// Parse `Retry-After` as delta seconds or as an HTTP date.
pub fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
