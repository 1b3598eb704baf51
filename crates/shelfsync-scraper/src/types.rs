//! Record and page types flowing through the crawl.
//!
//! ## Observed shape of the listing API
//!
//! The response envelope is a JSON object with a `Products` array and the
//! pagination fields `CurrentPage` / `TotalPages`. The same logical field can
//! change type between pages: `ProductID` arrives as a number on most pages
//! and as a string on others, prices are sometimes numeric strings, and the
//! pagination fields have been seen as both numbers and strings. Records are
//! therefore kept as dynamic JSON maps until normalization.

use serde::Serialize;
use serde_json::{Map, Value};

/// One entry of a page's product array, exactly as decoded.
pub type RawRecord = Map<String, Value>;

/// Key holding the product identifier in raw records.
pub const PRODUCT_ID_KEY: &str = "ProductID";
/// Key written by enrichment with the product detail-page URL.
pub const PRODUCT_URL_KEY: &str = "url";
/// Key written by enrichment with the RFC 3339 capture timestamp.
pub const SCRAPED_AT_KEY: &str = "scrapedDate";

/// A [`RawRecord`] that passed enrichment: its identifier is a non-empty
/// string and the detail URL and capture timestamp have been recorded.
///
/// Only [`crate::enrich::enrich_record`] constructs these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnrichedRecord(pub(crate) RawRecord);

impl EnrichedRecord {
    /// The canonical string identifier.
    #[must_use]
    pub fn product_id(&self) -> &str {
        self.0
            .get(PRODUCT_ID_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The constructed detail-page URL.
    #[must_use]
    pub fn product_url(&self) -> &str {
        self.0
            .get(PRODUCT_URL_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// All fields, including the enrichment fields.
    #[must_use]
    pub fn fields(&self) -> &RawRecord {
        &self.0
    }
}

/// Server-reported position within the result set.
///
/// Both values are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
        }
    }
}

impl PaginationState {
    /// The page to request next, or `None` once the server reports that the
    /// current page is the last one.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }
}

/// The product array and pagination metadata of one decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPage {
    pub records: Vec<RawRecord>,
    pub pagination: PaginationState,
}

/// Raw response of the listing API for one page request.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedPage {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_advances_until_total() {
        let state = PaginationState {
            current_page: 2,
            total_pages: 3,
        };
        assert_eq!(state.next_page(), Some(3));
    }

    #[test]
    fn next_page_is_none_on_last_page() {
        let state = PaginationState {
            current_page: 3,
            total_pages: 3,
        };
        assert_eq!(state.next_page(), None);
    }

    #[test]
    fn next_page_is_none_when_current_exceeds_total() {
        let state = PaginationState {
            current_page: 5,
            total_pages: 3,
        };
        assert_eq!(state.next_page(), None);
    }

    #[test]
    fn default_state_is_single_page() {
        assert_eq!(PaginationState::default().next_page(), None);
    }

    #[test]
    fn fetched_page_success_range() {
        let page = |status| FetchedPage {
            status,
            body: Vec::new(),
        };
        assert!(page(200).is_success());
        assert!(page(204).is_success());
        assert!(!page(301).is_success());
        assert!(!page(500).is_success());
    }
}
