use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Origin of the listing site, e.g. `"https://shop.example.com"`.
    pub source_base_url: String,
    pub source_api_token: String,
    pub listing_path: String,
    /// Path segment placed between the origin and the identifier in detail URLs.
    pub product_path: String,
    pub customer_settings: String,
    pub search_text: String,
    pub page_size: u32,
    pub sort_order: String,
    pub output_path: PathBuf,
    pub sink_url: Option<String>,
    pub sink_api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_pages: usize,
    pub page_delay_ms: u64,
    pub fetch_max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub upload_batch_size: usize,
    pub upload_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("source_base_url", &self.source_base_url)
            .field("source_api_token", &"[redacted]")
            .field("listing_path", &self.listing_path)
            .field("product_path", &self.product_path)
            .field(
                "customer_settings",
                &(!self.customer_settings.is_empty()).then_some("[redacted]"),
            )
            .field("search_text", &self.search_text)
            .field("page_size", &self.page_size)
            .field("sort_order", &self.sort_order)
            .field("output_path", &self.output_path)
            .field("sink_url", &self.sink_url)
            .field(
                "sink_api_token",
                &self.sink_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_pages", &self.max_pages)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("upload_batch_size", &self.upload_batch_size)
            .field("upload_delay_ms", &self.upload_delay_ms)
            .finish()
    }
}
