use crate::app_config::{AppConfig, Environment};
use crate::{ConfigError, MAX_UPLOAD_BATCH_SIZE};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let source_base_url = require("SHELFSYNC_SOURCE_BASE_URL")?
        .trim_end_matches('/')
        .to_string();
    if !(source_base_url.starts_with("http://") || source_base_url.starts_with("https://")) {
        return Err(invalid(
            "SHELFSYNC_SOURCE_BASE_URL",
            format!("\"{source_base_url}\" must start with http:// or https://"),
        ));
    }
    let source_api_token = require("SHELFSYNC_SOURCE_API_TOKEN")?;

    let env = parse_environment(&or_default("SHELFSYNC_ENV", "development"));
    let log_level = or_default("SHELFSYNC_LOG_LEVEL", "info");

    let listing_path = or_default("SHELFSYNC_LISTING_PATH", "/api/product/productlistdata");
    let product_path = or_default("SHELFSYNC_PRODUCT_PATH", "/p/");
    let customer_settings = or_default("SHELFSYNC_CUSTOMER_SETTINGS", "");
    let search_text = or_default("SHELFSYNC_SEARCH_TEXT", "s");
    let page_size = number_or(&lookup, "SHELFSYNC_PAGE_SIZE", 1000u32)?;
    if page_size == 0 {
        return Err(invalid("SHELFSYNC_PAGE_SIZE", "must be at least 1".into()));
    }
    let sort_order = or_default("SHELFSYNC_SORT_ORDER", "rdesc");
    let output_path = PathBuf::from(or_default("SHELFSYNC_OUTPUT_PATH", "output.json"));

    let sink_url = optional("SHELFSYNC_SINK_URL");
    let sink_api_token = optional("SHELFSYNC_SINK_API_TOKEN");

    let request_timeout_secs = number_or(&lookup, "SHELFSYNC_REQUEST_TIMEOUT_SECS", 30u64)?;
    let user_agent = or_default("SHELFSYNC_USER_AGENT", DEFAULT_USER_AGENT);
    let max_pages = number_or(&lookup, "SHELFSYNC_MAX_PAGES", 200usize)?;
    if max_pages == 0 {
        return Err(invalid("SHELFSYNC_MAX_PAGES", "must be at least 1".into()));
    }
    let page_delay_ms = number_or(&lookup, "SHELFSYNC_PAGE_DELAY_MS", 250u64)?;
    let fetch_max_retries = number_or(&lookup, "SHELFSYNC_FETCH_MAX_RETRIES", 0u32)?;
    let retry_backoff_base_secs = number_or(&lookup, "SHELFSYNC_RETRY_BACKOFF_BASE_SECS", 5u64)?;

    let upload_batch_size = number_or(&lookup, "SHELFSYNC_UPLOAD_BATCH_SIZE", 10usize)?;
    if !(1..=MAX_UPLOAD_BATCH_SIZE).contains(&upload_batch_size) {
        return Err(invalid(
            "SHELFSYNC_UPLOAD_BATCH_SIZE",
            format!("must be between 1 and {MAX_UPLOAD_BATCH_SIZE}, got {upload_batch_size}"),
        ));
    }
    let upload_delay_ms = number_or(&lookup, "SHELFSYNC_UPLOAD_DELAY_MS", 250u64)?;

    Ok(AppConfig {
        env,
        log_level,
        source_base_url,
        source_api_token,
        listing_path,
        product_path,
        customer_settings,
        search_text,
        page_size,
        sort_order,
        output_path,
        sink_url,
        sink_api_token,
        request_timeout_secs,
        user_agent,
        max_pages,
        page_delay_ms,
        fetch_max_retries,
        retry_backoff_base_secs,
        upload_batch_size,
        upload_delay_ms,
    })
}

/// Reads a numeric variable, falling back to `default` when it is unset.
fn number_or<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = lookup(var) else {
        return Ok(default);
    };
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: format!("\"{raw}\": {e}"),
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
