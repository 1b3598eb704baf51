//! Request body for the listing API's product-list endpoint.
//!
//! The endpoint expects every filter key to be present, so the filter struct
//! spells them all out even though a crawl leaves almost all of them empty.

use serde::Serialize;

/// Static parts of the listing request that stay the same for every page.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    pub search_text: String,
    pub page_size: u32,
    pub sort_order: String,
    pub customer_settings: String,
    pub api_token: String,
}

impl ListingQuery {
    /// Builds the request body for `page_number`.
    #[must_use]
    pub fn for_page(&self, page_number: u32) -> ListingRequest {
        ListingRequest {
            model: ListingModel {
                filtering_criterias: FilteringCriterias {
                    search_text_to_filter_by: self.search_text.clone(),
                    ..FilteringCriterias::default()
                },
                display_settings: DisplaySettings {
                    page_number,
                    view_mode: "grid".to_owned(),
                    page_size: self.page_size.to_string(),
                    sorting_order: self.sort_order.clone(),
                    analytics_tracking_category: "Search page".to_owned(),
                },
                current_customer_settings: self.customer_settings.clone(),
                api_token: self.api_token.clone(),
                data_returned_settings: DataReturnedSettings {
                    return_array_of_products: true,
                    ..DataReturnedSettings::default()
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingRequest {
    pub model: ListingModel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingModel {
    pub filtering_criterias: FilteringCriterias,
    pub display_settings: DisplaySettings,
    pub current_customer_settings: String,
    pub api_token: String,
    pub data_returned_settings: DataReturnedSettings,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilteringCriterias {
    pub category_tags_to_filter_by: String,
    pub category_ids_to_filter_by: String,
    pub brand_ids_to_filter_by: String,
    pub buy_list_ids_to_filter_by: String,
    pub search_text_to_filter_by: String,
    #[serde(rename = "urlwheretodisplay")]
    pub url_where_to_display: String,
    pub exclude_category_tags: String,
    pub exclude_category_ids: String,
    pub exclude_brand_ids: String,
    pub exclude_buy_list_ids: String,
    pub bottling_status: String,
    pub category: String,
    pub country: String,
    pub region: String,
    pub author: String,
    pub brand: String,
    pub grape_variety: String,
    pub flavour_profile: String,
    pub age: String,
    pub vintage: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub style: String,
    pub cask_type: String,
    pub single_cask: String,
    pub bottler: String,
    pub series: String,
    pub strength: String,
    pub size: String,
    pub certification: String,
    pub sustainability: String,
    pub aged_at_origin: String,
    pub limited_edition: String,
    pub food_pairing: String,
    pub colouring: String,
    pub flavour: String,
    pub is_on_offer: bool,
    pub include_out_of_stock: bool,
    /// Always sent as `null`; the endpoint rejects a missing key.
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplaySettings {
    pub page_number: u32,
    pub view_mode: String,
    /// Sent as a string; the endpoint ignores numeric page sizes.
    pub page_size: String,
    pub sorting_order: String,
    pub analytics_tracking_category: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataReturnedSettings {
    pub remove_selected_filters_from_filters_data: bool,
    #[serde(rename = "ReturnArrayOfProductDataForGA4")]
    pub return_array_of_product_data_for_ga4: bool,
    pub return_array_of_products: bool,
    pub return_product_list_html: bool,
}
