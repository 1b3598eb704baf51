//! Normalization from dynamically-typed [`RawRecord`]s to
//! [`shelfsync_core::OutputRecord`].
//!
//! Every coercion here is total: a field with an unexpected type degrades to
//! a documented default and a `warn!` diagnostic, never an error, so a single
//! malformed product cannot fail an upload batch.
//!
//! | Output field kind | Accepted input | Fallback |
//! |---|---|---|
//! | identifier | string, number | `""` |
//! | price / quantity | number, numeric string | `0.0` |
//! | free text | anything | rendered as text, `""` when absent |
//! | capture date | RFC 3339 timestamp or `YYYY-MM-DD` string | today (UTC) |

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Number, Value};
use shelfsync_core::OutputRecord;

use crate::types::{RawRecord, PRODUCT_ID_KEY, PRODUCT_URL_KEY, SCRAPED_AT_KEY};

const CAPTURE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalizes one record into the strict output schema.
///
/// Accepts both enriched and un-enriched records; fields that enrichment
/// would have filled in fall back to their defaults.
#[must_use]
pub fn normalize_record(record: &RawRecord) -> OutputRecord {
    let name = render_text(record.get("Name"));

    let sku = coerce_identifier(record.get(PRODUCT_ID_KEY)).unwrap_or_else(|| {
        tracing::warn!(
            product = %name,
            found = value_kind(record.get(PRODUCT_ID_KEY)),
            "ProductID is neither a string nor a number; using empty SKU"
        );
        String::new()
    });

    OutputRecord {
        price: coerce_number(record, "SalesPrice", &name),
        ex_vat_price: coerce_number(record, "SalesPriceExVat", &name),
        abv: render_text(record.get("StrengthInPC")),
        size: render_text(record.get("SizeInCL")),
        description: render_text(record.get("Description")),
        image_url: render_text(record.get("ProductImageUrl")),
        product_url: render_text(record.get(PRODUCT_URL_KEY)),
        scraped_date: capture_date(record, &name),
        is_active: render_text(record.get("IsActive")),
        max_order_quantity: coerce_number(record, "MaxOrderQuantity", &name),
        manufacturer: render_text(record.get("Manufacturer")),
        brand: render_text(record.get("Brand")),
        master_category_name: render_text(record.get("MasterCategoryName")),
        category_name: render_text(record.get("CategoryName")),
        weight: coerce_number(record, "Weight", &name),
        stock_level: coerce_number(record, "StockLevel", &name),
        stock_control: coerce_number(record, "StockControl", &name),
        is_out_of_stock: render_text(record.get("IsOutOfStock")),
        sku,
        name,
    }
}

/// Coerces an identifier value to its canonical string form.
///
/// Strings pass through unchanged. Numbers are formatted without exponent
/// notation or trailing zeros, so `12345.0` and `"12345"` agree. Returns
/// `None` for any other type, including an absent value.
#[must_use]
pub fn coerce_identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(n)),
        _ => None,
    }
}

/// Renders any JSON value as printable text.
///
/// Strings are returned verbatim, numbers use [`coerce_identifier`]'s
/// formatting, booleans become `"true"` / `"false"`, null and absent values
/// become `""`, and arrays and objects are rendered as compact JSON.
#[must_use]
pub fn render_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => format_number(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Formats a JSON number with no exponent and no trailing zeros.
///
/// Integers keep every digit. Floats use `f64`'s `Display`, which prints
/// integral values without a fractional part and never switches to
/// scientific notation.
fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    }
}

/// Reads a numeric field leniently: native numbers pass through, numeric
/// strings are parsed, anything else becomes `0.0` with a warning.
fn coerce_number(record: &RawRecord, key: &str, product: &str) -> f64 {
    let value = record.get(key);
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            tracing::warn!(
                product,
                field = key,
                found = value_kind(value),
                raw = %render_text(value),
                "could not read numeric field; using 0.0"
            );
            0.0
        }
    }
}

/// Formats the capture timestamp as `YYYY-MM-DD`, defaulting to today's UTC
/// date when the record carries no readable timestamp.
fn capture_date(record: &RawRecord, product: &str) -> String {
    let value = record.get(SCRAPED_AT_KEY);
    let parsed = value.and_then(Value::as_str).and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .or_else(|_| NaiveDate::parse_from_str(s, CAPTURE_DATE_FORMAT))
            .ok()
    });

    let date = parsed.unwrap_or_else(|| {
        let today = Utc::now().date_naive();
        tracing::warn!(
            product,
            found = value_kind(value),
            %today,
            "capture timestamp missing or unreadable; using current UTC date"
        );
        today
    });

    date.format(CAPTURE_DATE_FORMAT).to_string()
}

/// Short type name of a JSON value, for diagnostics.
pub(crate) fn value_kind(value: Option<&Value>) -> &'static str {
    match value {
        None => "absent",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
