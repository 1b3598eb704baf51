//! The persisted artifact: every record of a completed crawl as one
//! pretty-printed JSON array.

use std::path::Path;

use anyhow::Context;
use shelfsync_core::OutputRecord;

/// Deletes the output file left by a previous run. A missing file is not an
/// error; any other failure is logged and the run continues.
pub(crate) fn remove_stale_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed previous output file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove previous output file"
        ),
    }
}

/// Serializes the records as a pretty-printed JSON array.
pub(crate) fn render_output(records: &[OutputRecord]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(records)
}

pub(crate) fn write_output(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write output file {}", path.display()))
}
