//! Normalization from raw search hits to [`scout_core::ListingRecord`].

use scout_core::{ListingRecord, SearchFilters};

use crate::parse::parse_price;
use crate::types::SearchProduct;

/// Converts one search hit into a [`ListingRecord`].
///
/// Missing fields become empty strings or `None`; a price that cannot be
/// interpreted becomes `0` so the record is dropped by [`apply_contract`].
#[must_use]
pub fn normalize_listing(product: SearchProduct, marketplace_base_url: &str) -> ListingRecord {
    let source_id = product.id.as_ref().map(id_from_json).unwrap_or_default();

    let link = if source_id.is_empty() {
        String::new()
    } else {
        format!(
            "{}/p/{source_id}",
            marketplace_base_url.trim_end_matches('/')
        )
    };

    let price = product.price.as_ref().map_or(0, price_from_json);

    let (rating, rating_count) = product
        .rating
        .map_or((None, None), |r| {
            (
                r.average.as_ref().and_then(rating_from_json),
                r.count.as_ref().and_then(count_from_json),
            )
        });

    let (vendor_name, vendor_city) = product.vendor.map_or((String::new(), None), |v| {
        (
            v.name.unwrap_or_default(),
            v.owner
                .and_then(|o| o.city)
                .filter(|city| !city.trim().is_empty()),
        )
    });

    ListingRecord {
        source_id,
        name: product.name.unwrap_or_default(),
        price,
        image_url: product
            .photo
            .and_then(|p| p.medium)
            .filter(|url| !url.is_empty()),
        rating,
        rating_count,
        vendor_name,
        vendor_city,
        link,
    }
}

/// Applies the search contract to normalized records: drops zero-priced
/// records and anything `filters` rejects, then sorts ascending by price.
///
/// The sort is stable, so equal prices keep the endpoint's relevance order.
#[must_use]
pub fn apply_contract(records: Vec<ListingRecord>, filters: &SearchFilters) -> Vec<ListingRecord> {
    let mut kept: Vec<ListingRecord> = records
        .into_iter()
        .filter(|record| filters.accepts(record))
        .collect();
    kept.sort_by_key(|record| record.price);
    kept
}

fn price_from_json(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 1.0)
                .map_or(0, |f| parse_price(&format!("{}", f.trunc())))
        }),
        serde_json::Value::String(s) => parse_price(s),
        _ => 0,
    }
}

/// Integer ids keep their digits; integral floats drop the `.0`.
fn id_from_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract().abs() < f64::EPSILON)
                    .map_or_else(|| n.to_string(), |f| format!("{f:.0}"))
            }
        }
        serde_json::Value::String(s) => s.trim().to_owned(),
        _ => String::new(),
    }
}

fn rating_from_json(value: &serde_json::Value) -> Option<f64> {
    let rating = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (rating.is_finite() && rating >= 0.0).then_some(rating)
}

/// Non-negative counts; floats are truncated, anything else is `None`.
fn count_from_json(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .and_then(|f| format!("{:.0}", f.trunc()).parse().ok())
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
