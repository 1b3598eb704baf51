use thiserror::Error;

/// Errors returned by the downstream storage API client.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid sink URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to serialize upload batch: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The API answered with a non-2xx status. `body` is the response body
    /// exactly as received, or the read error if the body was cut off.
    #[error("sink API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

impl SinkError {
    /// Returns `true` if the batch never reached the API.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, SinkError::Http(_))
    }
}
