use serde::{Deserialize, Serialize};

/// One product in the strict schema the downstream storage table expects.
///
/// Field names on the wire match the table's column names, which is why
/// several of them are renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Canonical product identifier, always a string.
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "ExVATPrice")]
    pub ex_vat_price: f64,
    /// Alcohol strength, rendered as text (e.g. `"40"` or `"46.3"`).
    #[serde(rename = "ABV")]
    pub abv: String,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Image URL")]
    pub image_url: String,
    #[serde(rename = "Product URL")]
    pub product_url: String,
    /// Capture date as `YYYY-MM-DD`.
    #[serde(rename = "ScrapedDate")]
    pub scraped_date: String,
    #[serde(rename = "isActive")]
    pub is_active: String,
    #[serde(rename = "MaxOrderQuantity")]
    pub max_order_quantity: f64,
    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "MasterCategoryName")]
    pub master_category_name: String,
    #[serde(rename = "CategoryName")]
    pub category_name: String,
    #[serde(rename = "Weight")]
    pub weight: f64,
    #[serde(rename = "StockLevel")]
    pub stock_level: f64,
    #[serde(rename = "StockControl")]
    pub stock_control: f64,
    #[serde(rename = "isOutofStock")]
    pub is_out_of_stock: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutputRecord {
        OutputRecord {
            sku: "12345".to_owned(),
            name: "Glen Example 12 Year Old".to_owned(),
            price: 42.5,
            ex_vat_price: 35.42,
            abv: "40".to_owned(),
            size: "70".to_owned(),
            description: "Honeyed and soft.".to_owned(),
            image_url: "https://img.example.com/12345.jpg".to_owned(),
            product_url: "https://shop.example.com/p/12345".to_owned(),
            scraped_date: "2025-05-29".to_owned(),
            is_active: "true".to_owned(),
            max_order_quantity: 6.0,
            manufacturer: "Example Distillers".to_owned(),
            brand: "Glen Example".to_owned(),
            master_category_name: "Whisky".to_owned(),
            category_name: "Single Malt".to_owned(),
            weight: 1.4,
            stock_level: 12.0,
            stock_control: 1.0,
            is_out_of_stock: "false".to_owned(),
        }
    }

    #[test]
    fn serializes_with_table_column_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "SKU",
            "Name",
            "Price",
            "ExVATPrice",
            "ABV",
            "Size",
            "Description",
            "Image URL",
            "Product URL",
            "ScrapedDate",
            "isActive",
            "MaxOrderQuantity",
            "Manufacturer",
            "Brand",
            "MasterCategoryName",
            "CategoryName",
            "Weight",
            "StockLevel",
            "StockControl",
            "isOutofStock",
        ] {
            assert!(obj.contains_key(key), "missing column {key}");
        }
        assert_eq!(obj.len(), 20);
    }

    #[test]
    fn prices_serialize_as_numbers() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["Price"], serde_json::json!(42.5));
        assert_eq!(value["SKU"], serde_json::json!("12345"));
    }
}
