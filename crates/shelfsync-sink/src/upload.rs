//! Batch Uploader: sends the crawl's accumulated records to the storage table
//! in fixed-size batches under a fixed-delay throttle.

use std::time::Duration;

use shelfsync_core::MAX_UPLOAD_BATCH_SIZE;
use shelfsync_scraper::{normalize_record, EnrichedRecord};
use tokio_util::sync::CancellationToken;

use crate::client::SinkClient;
use crate::types::UploadReport;

/// Batching and throttling for one upload run.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Records per POST. Clamped to `1..=MAX_UPLOAD_BATCH_SIZE`.
    pub batch_size: usize,
    /// Pause between consecutive batches. No pause follows the last batch.
    pub batch_delay: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_UPLOAD_BATCH_SIZE,
            batch_delay: Duration::from_millis(250),
        }
    }
}

/// Uploads `records` in order, one batch at a time.
///
/// Records are normalized into the output schema as each batch is built. A
/// batch that fails, whether in transport or with a non-2xx status, is logged
/// and skipped; the remaining batches are still sent. Cancellation is
/// observed before every batch and during the inter-batch delay.
///
/// An empty `records` slice sends nothing.
pub async fn upload_all(
    sink: &SinkClient,
    records: &[EnrichedRecord],
    config: &UploadConfig,
    cancel: &CancellationToken,
) -> UploadReport {
    let batch_size = config.batch_size.clamp(1, MAX_UPLOAD_BATCH_SIZE);
    let total_batches = records.len().div_ceil(batch_size);
    let mut report = UploadReport::default();

    if records.is_empty() {
        tracing::info!("no records to upload");
        return report;
    }

    for (index, batch) in records.chunks(batch_size).enumerate() {
        let batch_number = index + 1;

        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        if index > 0 && !config.batch_delay.is_zero() {
            let interrupted = tokio::select! {
                () = cancel.cancelled() => true,
                () = tokio::time::sleep(config.batch_delay) => false,
            };
            if interrupted {
                report.cancelled = true;
                break;
            }
        }

        let rows = batch
            .iter()
            .map(|record| normalize_record(record.fields()))
            .collect();

        match sink.send_batch(rows).await {
            Ok(()) => {
                report.batches_sent += 1;
                report.records_uploaded += batch.len();
                tracing::info!(
                    batch = batch_number,
                    total_batches,
                    records = batch.len(),
                    "batch uploaded"
                );
            }
            Err(e) if e.is_transport() => {
                report.batches_failed += 1;
                tracing::error!(
                    batch = batch_number,
                    total_batches,
                    error = %e,
                    "batch send failed; skipping"
                );
            }
            Err(e) => {
                report.batches_failed += 1;
                tracing::error!(
                    batch = batch_number,
                    total_batches,
                    error = %e,
                    "batch rejected by sink API; skipping"
                );
            }
        }
    }

    if report.cancelled {
        tracing::warn!(
            batches_sent = report.batches_sent,
            batches_failed = report.batches_failed,
            total_batches,
            "upload cancelled"
        );
    } else {
        tracing::info!(
            batches_sent = report.batches_sent,
            batches_failed = report.batches_failed,
            records_uploaded = report.records_uploaded,
            "upload finished"
        );
    }

    report
}
