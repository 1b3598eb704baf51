//! `sync` command: crawl, persist, upload.
//!
//! Only a completed crawl is persisted and uploaded. A halted or cancelled
//! crawl logs what it collected and stops, so the storage table never receives
//! a partial catalog.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use shelfsync_core::{AppConfig, OutputRecord};
use shelfsync_scraper::{
    crawl, normalize_record, CrawlConfig, CrawlStatus, HttpPageFetcher, ProductUrlBuilder,
};
use shelfsync_sink::{upload_all, SinkClient, UploadConfig, UploadReport};
use tokio_util::sync::CancellationToken;

use crate::output::{remove_stale_output, render_output, write_output};

#[derive(Debug, Default)]
pub(crate) struct SyncOptions {
    pub dry_run: bool,
    /// Overrides `AppConfig::output_path`.
    pub output: Option<PathBuf>,
}

/// What a `sync` run did.
#[derive(Debug)]
pub(crate) struct SyncSummary {
    pub pages_fetched: usize,
    pub records_collected: usize,
    pub crawl_completed: bool,
    pub output_written: bool,
    /// `None` when the upload was skipped.
    pub upload: Option<UploadReport>,
}

/// Runs one crawl-persist-upload cycle.
///
/// # Errors
///
/// Returns an error only for setup failures: an invalid listing or sink URL,
/// missing sink settings outside a dry run, or an HTTP client that cannot be
/// built. Failures during the crawl, file write and upload are logged and
/// reflected in the returned [`SyncSummary`].
pub(crate) async fn run_sync(
    config: &AppConfig,
    options: &SyncOptions,
    cancel: &CancellationToken,
) -> anyhow::Result<SyncSummary> {
    let sink = if options.dry_run {
        None
    } else {
        Some(build_sink(config)?)
    };
    let fetcher =
        HttpPageFetcher::from_config(config).context("failed to build listing API fetcher")?;
    let urls = ProductUrlBuilder::new(&config.source_base_url, &config.product_path);
    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| config.output_path.clone());

    remove_stale_output(&output_path);

    let crawl_config = CrawlConfig {
        max_pages: config.max_pages,
        page_delay: Duration::from_millis(config.page_delay_ms),
    };
    tracing::info!(
        endpoint = %fetcher.endpoint(),
        max_pages = crawl_config.max_pages,
        "starting crawl"
    );
    let outcome = crawl(&fetcher, &urls, &crawl_config, cancel).await;

    let mut summary = SyncSummary {
        pages_fetched: outcome.pages_fetched,
        records_collected: outcome.records.len(),
        crawl_completed: outcome.is_complete(),
        output_written: false,
        upload: None,
    };

    match &outcome.status {
        CrawlStatus::Completed => {}
        CrawlStatus::Halted { reason } => {
            tracing::error!(
                pages_fetched = summary.pages_fetched,
                records = summary.records_collected,
                reason = %reason,
                "crawl did not complete; skipping output file and upload"
            );
            return Ok(summary);
        }
        CrawlStatus::Cancelled => {
            tracing::warn!(
                pages_fetched = summary.pages_fetched,
                records = summary.records_collected,
                "sync cancelled; skipping output file and upload"
            );
            return Ok(summary);
        }
    }

    let rows: Vec<OutputRecord> = outcome
        .records
        .iter()
        .map(|record| normalize_record(record.fields()))
        .collect();
    let contents = match render_output(&rows) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize output; ending run without upload");
            return Ok(summary);
        }
    };
    match write_output(&output_path, &contents) {
        Ok(()) => {
            summary.output_written = true;
            tracing::info!(
                path = %output_path.display(),
                records = rows.len(),
                "output file written"
            );
        }
        Err(e) => tracing::error!(error = %e, "continuing to upload without an output file"),
    }

    let Some(sink) = sink else {
        tracing::info!(records = rows.len(), "dry run; skipping upload");
        return Ok(summary);
    };

    let upload_config = UploadConfig {
        batch_size: config.upload_batch_size,
        batch_delay: Duration::from_millis(config.upload_delay_ms),
    };
    let report = upload_all(&sink, &outcome.records, &upload_config, cancel).await;
    if !report.is_clean() {
        tracing::warn!(?report, "upload finished with failures");
    }
    summary.upload = Some(report);

    Ok(summary)
}

fn build_sink(config: &AppConfig) -> anyhow::Result<SinkClient> {
    let url = config
        .sink_url
        .as_deref()
        .context("SHELFSYNC_SINK_URL is required unless --dry-run is given")?;
    let token = config
        .sink_api_token
        .as_deref()
        .context("SHELFSYNC_SINK_API_TOKEN is required unless --dry-run is given")?;
    SinkClient::new(url, token, config.request_timeout_secs, &config.user_agent)
        .context("failed to build sink client")
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
