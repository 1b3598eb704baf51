use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON decode error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("record disqualified: {reason}")]
    RecordDisqualified { reason: String },
}

impl ScraperError {
    /// Returns `true` for failures reaching the listing API (network, status,
    /// rate limiting), as opposed to failures interpreting its payload.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScraperError::Http(_)
                | ScraperError::RateLimited { .. }
                | ScraperError::UnexpectedStatus { .. }
        )
    }
}
