//! Pagination Driver: walks the listing API page by page and accumulates
//! enriched records.
//!
//! The loop is strictly sequential. Page `N + 1` is requested only after
//! page `N` has been decoded and its records appended, and the next page
//! number comes from the server's own `CurrentPage`/`TotalPages` on the page
//! just decoded rather than from a local counter.
//!
//! Any transport, status or decode failure halts the crawl. The records
//! collected so far are still returned in the [`CrawlOutcome`] so the caller
//! can report them.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::decode::decode_page;
use crate::enrich::{enrich_record, ProductUrlBuilder};
use crate::error::ScraperError;
use crate::fetch::PageFetcher;
use crate::types::{DecodedPage, EnrichedRecord};

/// Number of body bytes included in the log line for a non-2xx page.
const ERROR_BODY_PREVIEW_BYTES: usize = 512;

/// Limits applied to one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Pages fetched before the crawl halts with
    /// [`ScraperError::PaginationLimit`]. Guards against a server whose
    /// reported position never reaches its total.
    pub max_pages: usize,
    /// Pause before every page request after the first.
    pub page_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 200,
            page_delay: Duration::ZERO,
        }
    }
}

/// How a crawl ended.
#[derive(Debug)]
pub enum CrawlStatus {
    /// The last fetched page reported itself as the final page.
    Completed,
    /// A page could not be fetched or decoded, or the page limit was hit.
    Halted { reason: ScraperError },
    /// The cancellation token fired before the crawl finished.
    Cancelled,
}

/// Result of [`crawl`]. `records` holds everything accumulated up to the point
/// the crawl ended, whatever the status.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub records: Vec<EnrichedRecord>,
    pub pages_fetched: usize,
    pub status: CrawlStatus,
}

impl CrawlOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.status, CrawlStatus::Completed)
    }
}

/// Crawls the listing API starting from page 1 until the server reports the
/// last page.
///
/// Records whose identifier cannot be resolved are dropped with a warning and
/// do not affect the crawl. Cancellation is observed before every page, during
/// the inter-page delay and during the fetcher's retry backoff; an in-flight
/// request is allowed to finish.
pub async fn crawl<F>(
    fetcher: &F,
    urls: &ProductUrlBuilder,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> CrawlOutcome
where
    F: PageFetcher + ?Sized,
{
    let mut records: Vec<EnrichedRecord> = Vec::new();
    let mut pages_fetched = 0usize;
    let mut next_page = Some(1u32);

    let status = loop {
        let Some(page) = next_page else {
            break CrawlStatus::Completed;
        };

        if cancel.is_cancelled() {
            break CrawlStatus::Cancelled;
        }

        if pages_fetched >= config.max_pages {
            break CrawlStatus::Halted {
                reason: ScraperError::PaginationLimit {
                    max_pages: config.max_pages,
                },
            };
        }

        if pages_fetched > 0 && !config.page_delay.is_zero() {
            let interrupted = tokio::select! {
                () = cancel.cancelled() => true,
                () = tokio::time::sleep(config.page_delay) => false,
            };
            if interrupted {
                break CrawlStatus::Cancelled;
            }
        }

        let decoded = match fetch_and_decode(fetcher, page, cancel, &mut pages_fetched).await {
            Ok(decoded) => decoded,
            Err(reason) if cancel.is_cancelled() => {
                tracing::debug!(page, error = %reason, "page abandoned after cancellation");
                break CrawlStatus::Cancelled;
            }
            Err(reason) => {
                tracing::error!(
                    page,
                    error = %reason,
                    transport = reason.is_transport(),
                    "page failed; halting crawl"
                );
                break CrawlStatus::Halted { reason };
            }
        };

        let yielded = decoded.records.len();
        let captured_at = Utc::now();
        let mut dropped = 0usize;
        for raw in decoded.records {
            match enrich_record(raw, urls, captured_at) {
                Ok(record) => records.push(record),
                Err(e) => {
                    dropped += 1;
                    tracing::warn!(page, error = %e, "dropping record");
                }
            }
        }

        tracing::info!(
            page,
            current_page = decoded.pagination.current_page,
            total_pages = decoded.pagination.total_pages,
            yielded,
            dropped,
            accumulated = records.len(),
            "page collected"
        );

        next_page = decoded.pagination.next_page();
    };

    match &status {
        CrawlStatus::Completed => tracing::info!(
            pages_fetched,
            records = records.len(),
            "crawl completed"
        ),
        CrawlStatus::Halted { reason } => tracing::warn!(
            pages_fetched,
            records = records.len(),
            reason = %reason,
            "crawl halted with partial results"
        ),
        CrawlStatus::Cancelled => tracing::warn!(
            pages_fetched,
            records = records.len(),
            "crawl cancelled with partial results"
        ),
    }

    CrawlOutcome {
        records,
        pages_fetched,
        status,
    }
}

/// Fetches and decodes one page, classifying non-2xx responses as
/// [`ScraperError::UnexpectedStatus`]. `pages_fetched` counts every page for
/// which a response arrived.
async fn fetch_and_decode<F>(
    fetcher: &F,
    page: u32,
    cancel: &CancellationToken,
    pages_fetched: &mut usize,
) -> Result<DecodedPage, ScraperError>
where
    F: PageFetcher + ?Sized,
{
    let fetched = fetcher.fetch_page(page, cancel).await?;
    *pages_fetched += 1;

    if !fetched.is_success() {
        let preview_len = fetched.body.len().min(ERROR_BODY_PREVIEW_BYTES);
        tracing::error!(
            page,
            status = fetched.status,
            body = %String::from_utf8_lossy(&fetched.body[..preview_len]),
            "listing API returned non-success status"
        );
        return Err(ScraperError::UnexpectedStatus {
            status: fetched.status,
            url: format!("listing page {page}"),
        });
    }

    decode_page(&fetched.body)
}

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;
