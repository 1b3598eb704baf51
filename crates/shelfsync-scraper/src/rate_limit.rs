//! Retry policy for the listing-API fetcher.
//!
//! Off by default: with `max_retries = 0` a failed request is reported to the
//! crawl loop straight away and the crawl halts. When enabled, only 429
//! responses and network errors are retried, and every wait ends early when
//! the crawl's cancellation token fires.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;

/// Exponential backoff for transient listing-API failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Wait before retry `n` (0-based) is `backoff_base_secs * 2^n`.
    pub backoff_base_secs: u64,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based) after `err`.
    ///
    /// A server `Retry-After` hint raises the delay but never lowers it, and
    /// is honoured only up to `backoff_base_secs * 2^max_retries`. A zero base
    /// disables waiting entirely, hint included.
    fn delay_for(self, retry: u32, err: &ScraperError) -> Duration {
        if self.backoff_base_secs == 0 {
            return Duration::ZERO;
        }
        let backoff = self.backoff(retry);
        let hinted = match err {
            ScraperError::RateLimited {
                retry_after_secs, ..
            } => backoff.max((*retry_after_secs).min(self.backoff(self.max_retries))),
            _ => backoff,
        };
        Duration::from_secs(hinted)
    }

    fn backoff(self, retry: u32) -> u64 {
        self.backoff_base_secs
            .saturating_mul(1u64 << retry.min(62))
    }

    /// Runs `request` until it succeeds, fails with a non-transient error, the
    /// retry budget is spent, or `cancel` fires during a backoff wait. The
    /// last error is returned in every case but the first.
    pub(crate) async fn run<T, F, Fut>(
        self,
        cancel: &CancellationToken,
        mut request: F,
    ) -> Result<T, ScraperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) && retry < self.max_retries => err,
                Err(err) => return Err(err),
            };

            let delay = self.delay_for(retry, &err);
            tracing::warn!(
                retry = retry + 1,
                max_retries = self.max_retries,
                delay_secs = delay.as_secs(),
                error = %err,
                "listing request failed; backing off"
            );
            let interrupted = tokio::select! {
                () = cancel.cancelled() => true,
                () = tokio::time::sleep(delay) => false,
            };
            if interrupted {
                tracing::debug!(retry = retry + 1, "backoff interrupted by cancellation");
                return Err(err);
            }
            retry += 1;
        }
    }
}

/// 429 responses and network-level failures. Anything else would fail the
/// same way again.
fn is_transient(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. } | ScraperError::Http(_)
    )
}
