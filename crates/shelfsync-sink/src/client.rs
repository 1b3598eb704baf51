use std::time::Duration;

use reqwest::{Client, Url};
use shelfsync_core::OutputRecord;

use crate::error::SinkError;
use crate::types::UploadPayload;

/// HTTP client for the downstream storage table.
///
/// Each call to [`SinkClient::send_batch`] issues exactly one bearer-token
/// authenticated POST. Nothing is retried.
pub struct SinkClient {
    client: Client,
    url: Url,
    token: String,
}

impl SinkClient {
    /// Creates a client for the table endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::InvalidUrl`] if `url` is not an absolute http(s)
    /// URL, or [`SinkError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(
        url: &str,
        token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SinkError> {
        let parsed = Url::parse(url).map_err(|e| SinkError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SinkError::InvalidUrl {
                url: url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            url: parsed,
            token: token.to_owned(),
        })
    }

    /// Posts one batch of records.
    ///
    /// # Errors
    ///
    /// - [`SinkError::Serialize`] if the payload cannot be encoded.
    /// - [`SinkError::Http`] if the request never got a response.
    /// - [`SinkError::Api`] for any non-2xx status, carrying the response body
    ///   or, if the body could not be read, a description of the read error.
    pub async fn send_batch(&self, records: Vec<OutputRecord>) -> Result<(), SinkError> {
        let payload: UploadPayload = records.into_iter().collect();
        let body = serde_json::to_vec(&payload)?;

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        status = status.as_u16(),
                        error = %e,
                        "failed to read sink error response body"
                    );
                    format!("<unreadable response body: {e}>")
                }
            };
            return Err(SinkError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
