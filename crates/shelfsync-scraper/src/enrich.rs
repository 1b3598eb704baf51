//! Collection-time enrichment of raw records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::ScraperError;
use crate::normalize::{coerce_identifier, render_text, value_kind};
use crate::types::{EnrichedRecord, RawRecord, PRODUCT_ID_KEY, PRODUCT_URL_KEY, SCRAPED_AT_KEY};

/// Builds detail-page URLs as `base_url + product_path + identifier`.
#[derive(Debug, Clone)]
pub struct ProductUrlBuilder {
    prefix: String,
}

impl ProductUrlBuilder {
    /// `base_url` is the site origin (a trailing slash is ignored) and
    /// `product_path` the path segment placed before the identifier, e.g.
    /// `"/p/"`.
    #[must_use]
    pub fn new(base_url: &str, product_path: &str) -> Self {
        let path = product_path.trim_matches('/');
        let prefix = if path.is_empty() {
            format!("{}/", base_url.trim_end_matches('/'))
        } else {
            format!("{}/{path}/", base_url.trim_end_matches('/'))
        };
        Self { prefix }
    }

    #[must_use]
    pub fn build(&self, product_id: &str) -> String {
        format!("{}{product_id}", self.prefix)
    }
}

/// Enriches one raw record with its canonical identifier, detail URL and
/// capture timestamp.
///
/// The identifier is rewritten in place as a string so every later reader
/// sees one type regardless of what the page sent.
///
/// # Errors
///
/// Returns [`ScraperError::RecordDisqualified`] if the identifier is absent,
/// of an unrecognized type, or blank. The caller drops the record and
/// continues.
pub fn enrich_record(
    mut record: RawRecord,
    urls: &ProductUrlBuilder,
    captured_at: DateTime<Utc>,
) -> Result<EnrichedRecord, ScraperError> {
    let raw_id = record.get(PRODUCT_ID_KEY);
    let product_id = coerce_identifier(raw_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ScraperError::RecordDisqualified {
            reason: format!(
                "ProductID of \"{}\" is {} ({})",
                render_text(record.get("Name")),
                value_kind(raw_id),
                render_text(raw_id),
            ),
        })?;

    let product_url = urls.build(&product_id);
    record.insert(PRODUCT_ID_KEY.to_owned(), Value::String(product_id));
    record.insert(PRODUCT_URL_KEY.to_owned(), Value::String(product_url));
    record.insert(
        SCRAPED_AT_KEY.to_owned(),
        Value::String(captured_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );

    Ok(EnrichedRecord(record))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::normalize::normalize_record;

    fn urls() -> ProductUrlBuilder {
        ProductUrlBuilder::new("https://shop.example.com", "/p/")
    }

    fn captured_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 29, 15, 42, 57).unwrap()
    }

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn url_builder_joins_segments() {
        assert_eq!(urls().build("29388"), "https://shop.example.com/p/29388");
        assert_eq!(
            ProductUrlBuilder::new("https://shop.example.com/", "p").build("1"),
            "https://shop.example.com/p/1"
        );
        assert_eq!(
            ProductUrlBuilder::new("https://shop.example.com", "").build("1"),
            "https://shop.example.com/1"
        );
    }

    #[test]
    fn numeric_identifier_is_rewritten_as_string() {
        let enriched =
            enrich_record(raw(json!({"ProductID": 29388.0})), &urls(), captured_at()).unwrap();
        assert_eq!(enriched.product_id(), "29388");
        assert_eq!(enriched.fields()["ProductID"], json!("29388"));
    }

    #[test]
    fn enrichment_adds_url_and_timestamp() {
        let enriched =
            enrich_record(raw(json!({"ProductID": "23771"})), &urls(), captured_at()).unwrap();
        assert_eq!(enriched.product_url(), "https://shop.example.com/p/23771");
        assert_eq!(enriched.fields()["scrapedDate"], json!("2025-05-29T15:42:57Z"));
    }

    #[test]
    fn enriched_record_normalizes_with_capture_date() {
        let enriched = enrich_record(
            raw(json!({"ProductID": 7, "Name": "Seven"})),
            &urls(),
            captured_at(),
        )
        .unwrap();
        let out = normalize_record(enriched.fields());
        assert_eq!(out.sku, "7");
        assert_eq!(out.product_url, "https://shop.example.com/p/7");
        assert_eq!(out.scraped_date, "2025-05-29");
    }

    #[test]
    fn missing_identifier_disqualifies_record() {
        let err = enrich_record(raw(json!({"Name": "Nameless"})), &urls(), captured_at())
            .unwrap_err();
        assert!(
            matches!(err, ScraperError::RecordDisqualified { ref reason } if reason.contains("absent")),
            "got: {err:?}"
        );
    }

    #[test]
    fn unrecognized_identifier_type_disqualifies_record() {
        let err = enrich_record(raw(json!({"ProductID": {"id": 1}})), &urls(), captured_at())
            .unwrap_err();
        assert!(matches!(err, ScraperError::RecordDisqualified { .. }));
    }

    #[test]
    fn string_identifier_is_kept_verbatim() {
        let enriched =
            enrich_record(raw(json!({"ProductID": " 123 "})), &urls(), captured_at()).unwrap();
        assert_eq!(enriched.product_id(), " 123 ");
        assert_eq!(enriched.product_url(), "https://shop.example.com/p/ 123 ");
        assert_eq!(normalize_record(enriched.fields()).sku, " 123 ");
    }

    #[test]
    fn blank_identifier_disqualifies_record() {
        let err =
            enrich_record(raw(json!({"ProductID": "  "})), &urls(), captured_at()).unwrap_err();
        assert!(matches!(err, ScraperError::RecordDisqualified { .. }));
    }
}
