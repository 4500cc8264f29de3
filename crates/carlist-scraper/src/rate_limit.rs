//! Throttling sleeps and retry for transient fetch failures.

use std::future::Future;

use carlist_core::DelayRange;

use crate::error::ScraperError;

/// Returns `true` if `err` is worth another attempt.
///
/// Network failures, empty bodies, 403/429 (the site's block responses) and
/// 5xx are retried. Other statuses and URL errors are not.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(_) | ScraperError::EmptyBody { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => {
            matches!(status, 403 | 429) || (500..600).contains(status)
        }
        ScraperError::InvalidUrl { .. } | ScraperError::InvalidProxy { .. } => false,
    }
}

/// Runs `operation` up to `max_attempts` times.
///
/// `operation` receives the 1-based attempt number. After a retriable
/// failure the task sleeps for a sample of `backoff` multiplied by the
/// attempt number, so later retries wait longer. Non-retriable errors and
/// the error from the final attempt are returned as-is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff: DelayRange,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_attempts {
            return Err(err);
        }

        let delay = backoff.sample() * attempt;
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "fetch failed, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Sleeps for a random duration drawn from `range`. A zero range returns
/// immediately.
pub(crate) async fn pause(range: DelayRange) {
    if range.is_zero() {
        return;
    }
    tokio::time::sleep(range.sample()).await;
}
