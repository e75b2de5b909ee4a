//! Backoff loop around a dealer page fetch.
//!
//! Only 429 responses and network-level errors are retried. Upstream status
//! errors and payload failures propagate immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

fn is_transient(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. } | ScraperError::Http(_)
    )
}

/// Runs `fetch` up to `max_retries + 1` times, sleeping
/// `backoff_base_secs * 2^n` seconds before the n-th retry. The last
/// transient error is returned once retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut fetch: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match fetch().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && retry < max_retries => err,
            Err(err) => return Err(err),
        };

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << retry.min(62));
        tracing::warn!(
            retry = retry + 1,
            max_retries,
            delay_secs,
            error = %err,
            "dealer fetch failed, backing off"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        retry += 1;
    }
}
