//! Page Decoder: raw listing-API response bytes to [`DecodedPage`].
//!
//! The fetcher normally negotiates `Content-Encoding` itself, but the listing
//! API has been seen returning brotli bodies without advertising them. Every
//! body is run through a brotli decoder first; if that fails the unmodified
//! bytes are parsed unchanged.

use std::io::Read;

use serde_json::{Map, Value};

use crate::error::ScraperError;
use crate::normalize::value_kind;
use crate::types::{DecodedPage, PaginationState, RawRecord};

/// Key of the product array in the response envelope.
const PRODUCTS_KEY: &str = "Products";
const CURRENT_PAGE_KEY: &str = "CurrentPage";
const TOTAL_PAGES_KEY: &str = "TotalPages";

const BROTLI_BUFFER_SIZE: usize = 4096;

/// Decodes one page of the listing API.
///
/// Yields every object in the `Products` array as a [`RawRecord`] together
/// with the page's [`PaginationState`]. A missing or non-array `Products`
/// field is a valid empty page. Pagination fields that are absent or
/// unreadable fall back to `1` with a warning and never fail the decode.
///
/// # Errors
///
/// Returns [`ScraperError::Decode`] if neither the decompressed nor the raw
/// payload is a JSON object.
pub fn decode_page(body: &[u8]) -> Result<DecodedPage, ScraperError> {
    let document = parse_document(body)?;

    let pagination = PaginationState {
        current_page: read_page_number(&document, CURRENT_PAGE_KEY),
        total_pages: read_page_number(&document, TOTAL_PAGES_KEY),
    };

    let records = extract_records(document);

    Ok(DecodedPage {
        records,
        pagination,
    })
}

/// Parses the response envelope, preferring a brotli-decompressed payload and
/// falling back to the raw bytes when decompression fails or does not yield
/// a JSON object.
fn parse_document(body: &[u8]) -> Result<Map<String, Value>, ScraperError> {
    if let Some(decompressed) = brotli_decompress(body) {
        match serde_json::from_slice(&decompressed) {
            Ok(document) => return Ok(document),
            Err(e) => {
                tracing::debug!(error = %e, "brotli output is not a JSON object; using raw body");
            }
        }
    }

    serde_json::from_slice(body).map_err(|e| ScraperError::Decode {
        context: format!("listing page ({} bytes)", body.len()),
        source: e,
    })
}

/// Returns the brotli-decompressed body, or `None` if `body` is not a valid
/// brotli stream. Failure is expected for bodies the fetcher already decoded.
fn brotli_decompress(body: &[u8]) -> Option<Vec<u8>> {
    let mut decompressed = Vec::new();
    match brotli::Decompressor::new(body, BROTLI_BUFFER_SIZE).read_to_end(&mut decompressed) {
        Ok(_) if !decompressed.is_empty() => {
            tracing::debug!(
                compressed = body.len(),
                decompressed = decompressed.len(),
                "brotli decompression succeeded"
            );
            Some(decompressed)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "brotli decompression failed; using raw body");
            None
        }
    }
}

/// Takes the object entries of the `Products` array, skipping anything that
/// is not an object.
fn extract_records(mut document: Map<String, Value>) -> Vec<RawRecord> {
    let products = match document.remove(PRODUCTS_KEY) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!(
                found = value_kind(Some(&other)),
                "Products is not an array; treating page as empty"
            );
            return Vec::new();
        }
        None => {
            tracing::debug!("Products missing; treating page as empty");
            return Vec::new();
        }
    };

    products
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(record) => Some(record),
            other => {
                tracing::warn!(
                    index,
                    found = value_kind(Some(&other)),
                    "skipping product entry that is not an object"
                );
                None
            }
        })
        .collect()
}

/// Reads a pagination field, accepting integers, floats (truncated toward
/// zero) and numeric strings. Anything else, including values below 1, falls
/// back to `1`.
fn read_page_number(document: &Map<String, Value>, key: &str) -> u32 {
    let value = document.get(key);
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(float_to_u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed.and_then(|n| u32::try_from(n).ok()).filter(|n| *n >= 1) {
        Some(n) => n,
        None => {
            tracing::warn!(
                field = key,
                found = value_kind(value),
                "pagination field missing or unreadable; defaulting to 1"
            );
            1
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_u64(f: f64) -> u64 {
    // Callers guarantee `f` is finite and non-negative. The cast truncates the
    // fraction; values past u64::MAX saturate and fail the u32 conversion.
    f as u64
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;
