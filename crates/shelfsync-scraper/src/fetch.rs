use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use shelfsync_core::AppConfig;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::rate_limit::RetryPolicy;
use crate::request::ListingQuery;
use crate::types::FetchedPage;

/// Source of raw listing pages for the crawl loop.
///
/// Implementations return the response status and body for a page number and
/// leave classification of the status to the caller. Only failures to obtain
/// a response at all are errors. Any waiting an implementation does between
/// attempts must end when `cancel` fires.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        page_number: u32,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, ScraperError>;
}

/// [`PageFetcher`] that POSTs the listing request payload to the listing API.
///
/// `reqwest` negotiates gzip and brotli with the server; bodies that arrive
/// compressed without a `Content-Encoding` header are handled by the decoder.
///
/// HTTP 429 and network errors are retried with exponential backoff up to
/// `max_retries` additional attempts. The default is no retries. A backoff
/// wait is abandoned as soon as the crawl is cancelled.
pub struct HttpPageFetcher {
    client: Client,
    endpoint: Url,
    origin: String,
    referer: String,
    query: ListingQuery,
    retry: RetryPolicy,
}

impl HttpPageFetcher {
    /// Creates a fetcher for `base_url` + `listing_path` with the configured
    /// timeout and `User-Agent`. Retries are disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL or `listing_path` cannot be joined onto it, and
    /// [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        listing_path: &str,
        query: ListingQuery,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let base = parse_base_url(base_url)?;
        let endpoint = base
            .join(listing_path)
            .map_err(|e| ScraperError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: format!("cannot join listing path \"{listing_path}\": {e}"),
            })?;
        let origin = base.origin().ascii_serialization();
        let referer = format!("{origin}/");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            origin,
            referer,
            query,
            retry: RetryPolicy::default(),
        })
    }

    /// Builds a fetcher from the application config, including its retry
    /// policy.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let query = ListingQuery {
            search_text: config.search_text.clone(),
            page_size: config.page_size,
            sort_order: config.sort_order.clone(),
            customer_settings: config.customer_settings.clone(),
            api_token: config.source_api_token.clone(),
        };
        Ok(Self::new(
            &config.source_base_url,
            &config.listing_path,
            query,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retries(config.fetch_max_retries, config.retry_backoff_base_secs))
    }

    /// Enables retries for 429 responses and network errors.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.retry = RetryPolicy {
            max_retries,
            backoff_base_secs,
        };
        self
    }

    /// The resolved listing endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send_once(&self, page_number: u32) -> Result<FetchedPage, ScraperError> {
        let payload = self.query.for_page(page_number);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "*/*")
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=UTF-8",
            )
            .header("Apitoken", format!("\"{}\"", self.query.api_token))
            .header(reqwest::header::ORIGIN, &self.origin)
            .header(reqwest::header::REFERER, &self.referer)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: self.endpoint.host_str().unwrap_or_default().to_owned(),
                retry_after_secs,
            });
        }

        let body = response.bytes().await?;
        tracing::debug!(
            page = page_number,
            status = status.as_u16(),
            bytes = body.len(),
            "listing page response received"
        );

        Ok(FetchedPage {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(
        &self,
        page_number: u32,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, ScraperError> {
        self.retry
            .run(cancel, || self.send_once(page_number))
            .await
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason,
    };
    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(url)
}
