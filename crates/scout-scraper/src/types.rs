//! Wire types for the marketplace product-search endpoint.
//!
//! ## Observed shape
//!
//! ```json
//! { "products": [ {
//!     "id": 16078271,
//!     "name": "...",
//!     "price": 2450000,
//!     "photo": { "MEDIUM": "https://statics.basalam.com/public/users/..." },
//!     "rating": { "average": 4.6, "count": 38 },
//!     "vendor": { "name": "...", "owner": { "city": "Tabriz" } }
//! } ] }
//! ```
//!
//! `id` has been seen as an integer, a float and a string. `price`,
//! `rating.average` and `rating.count` are usually numbers but some responses
//! carry floats, negatives or numeric strings. All of these are kept as raw
//! JSON values and normalized later. Every nested object may be absent or
//! `null`.
//!
//! Hits are decoded one at a time (see [`SearchResponse::into_products`]) so
//! a single malformed hit is dropped instead of failing the whole response.

use serde::Deserialize;

/// Top-level response from the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub products: Vec<serde_json::Value>,
}

impl SearchResponse {
    /// Decodes each hit, logging and skipping any that do not fit
    /// [`SearchProduct`].
    #[must_use]
    pub fn into_products(self) -> Vec<SearchProduct> {
        self.products
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value(raw) {
                Ok(product) => Some(product),
                Err(error) => {
                    tracing::warn!(index, %error, "skipping malformed search hit");
                    None
                }
            })
            .collect()
    }
}

/// One search hit.
#[derive(Debug, Deserialize)]
pub struct SearchProduct {
    /// Raw identifier; see the module docs.
    #[serde(default)]
    pub id: Option<serde_json::Value>,

    #[serde(default)]
    pub name: Option<String>,

    /// Raw price value; see the module docs.
    #[serde(default)]
    pub price: Option<serde_json::Value>,

    #[serde(default)]
    pub photo: Option<SearchPhoto>,

    #[serde(default)]
    pub rating: Option<SearchRating>,

    #[serde(default)]
    pub vendor: Option<SearchVendor>,
}

#[derive(Debug, Deserialize)]
pub struct SearchPhoto {
    #[serde(rename = "MEDIUM", default)]
    pub medium: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRating {
    #[serde(default)]
    pub average: Option<serde_json::Value>,
    #[serde(default)]
    pub count: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchVendor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<SearchVendorOwner>,
}

#[derive(Debug, Deserialize)]
pub struct SearchVendorOwner {
    #[serde(default)]
    pub city: Option<String>,
}
