use serde::Serialize;
use shelfsync_core::OutputRecord;

/// Request body for one batch: `{"records": [{"fields": {...}}, ...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadPayload {
    pub records: Vec<UploadRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadRow {
    pub fields: OutputRecord,
}

impl FromIterator<OutputRecord> for UploadPayload {
    fn from_iter<I: IntoIterator<Item = OutputRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().map(|fields| UploadRow { fields }).collect(),
        }
    }
}

/// Per-run summary returned by [`crate::upload_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Batches the API accepted with a 2xx status.
    pub batches_sent: usize,
    /// Batches skipped after a transport failure or rejected with a non-2xx
    /// status.
    pub batches_failed: usize,
    /// Records contained in accepted batches.
    pub records_uploaded: usize,
    /// `true` if the cancellation token stopped the upload before every
    /// batch was attempted.
    pub cancelled: bool,
}

impl UploadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.batches_failed == 0 && !self.cancelled
    }
}
