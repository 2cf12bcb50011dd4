//! HTTP retry helper for geocoding requests.
//!
//! Geocoding clients go through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly. Transient failures
//! (timeouts, connection resets, HTTP 429, HTTP 5xx) are retried with
//! exponential backoff up to the policy's `max_retries`. With the default
//! policy every logical call makes exactly one HTTP request.

use std::time::Duration;

use crate::GeocodeError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on every further retry.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Returns the policy with a different retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(factor)
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (since builders are consumed by
/// `.send()`).
///
/// Does **not** retry HTTP 4xx (except 429); these are permanent.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    policy: RetryPolicy,
) -> Result<serde_json::Value, GeocodeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, policy).await?;
    let status = response.status();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::debug!("Unparseable geocoder response (status={status}): {preview}");
        GeocodeError::Parse {
            message: format!("response is not JSON: {e}"),
        }
    })
}

#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    policy: RetryPolicy,
) -> Result<reqwest::Response, GeocodeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let can_retry = attempt < max_retries;
        attempt += 1;

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) if is_transient(&e) && can_retry => {
                log::warn!("  transient error: {}", e.without_url());
                continue;
            }
            Err(e) => return Err(GeocodeError::Http(e.without_url())),
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if can_retry {
                log::warn!("  HTTP 429 (rate limited)");
                continue;
            }
            return Err(GeocodeError::RateLimited);
        }

        if status.is_server_error() {
            if can_retry {
                log::warn!("  HTTP {status} (server error)");
                continue;
            }
            return Err(GeocodeError::HttpStatus(status));
        }

        if status.is_client_error() {
            return Err(GeocodeError::HttpStatus(status));
        }

        return Ok(response);
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
