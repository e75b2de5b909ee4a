//! HTTP client for coches.net dealer listing pages.

mod target;

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

pub use target::build_dealer_url;
#[cfg(test)]
use target::extract_domain;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_ES: &str = "es-ES,es;q=0.9";

/// Retry-After fallback when a 429 carries no usable header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Fetches dealer pages as HTML.
///
/// 429 and non-2xx responses surface as typed errors. Transient failures
/// (429, network errors) are retried with exponential backoff up to
/// `max_retries` additional attempts.
pub struct DealerClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl DealerClient {
    /// Creates a `DealerClient` with configured timeout, `User-Agent`, and
    /// retry policy. `max_retries = 0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches `url` and returns the response body as text.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::UpstreamStatus`]: any other non-2xx status.
    /// - [`ScraperError::Http`]: network or TLS failure after all retries.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, ACCEPT_HTML)
                .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_ES)
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(ScraperError::RateLimited {
                    domain: target::extract_domain(url),
                    retry_after_secs,
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UpstreamStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            let body = response.text().await?;
            tracing::debug!(url, bytes = body.len(), "fetched dealer page");
            Ok(body)
        })
        .await
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
