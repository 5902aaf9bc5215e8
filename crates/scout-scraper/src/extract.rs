//! Field extraction from marketplace product-detail pages.
//!
//! Every field has a primary selector and a fallback. When neither matches,
//! the field keeps its zero value; extraction itself never fails.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use scout_core::{CrawlStatus, EnrichedRecord, MAX_REVIEWS};
use scraper::{Html, Selector};

use crate::html::{attr, css, first_text, meta_content, visible_text};
use crate::parse::{parse_price, parse_rating};

static NAME: LazyLock<Selector> = LazyLock::new(|| css("h1.thh9OB"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| css("span.PlpxQp"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| css("p.bs-read-more__text"));
static SPEC_ITEM: LazyLock<Selector> = LazyLock::new(|| css(".specification-item"));
static SPEC_KEY: LazyLock<Selector> = LazyLock::new(|| css(".spec-key"));
static SPEC_VALUE: LazyLock<Selector> = LazyLock::new(|| css(".spec-value"));
static SPEC_ROW: LazyLock<Selector> = LazyLock::new(|| css(".product-specs tr"));
static TD: LazyLock<Selector> = LazyLock::new(|| css("td"));
static REVIEW: LazyLock<Selector> = LazyLock::new(|| css(".review-item"));
static REVIEW_FALLBACK: LazyLock<Selector> = LazyLock::new(|| css(".comment-item"));
static RATING: LazyLock<Selector> = LazyLock::new(|| css(".rating-average"));
static RATING_FALLBACK: LazyLock<Selector> = LazyLock::new(|| css("[class*=rating]"));
static VENDOR: LazyLock<Selector> = LazyLock::new(|| css(".vendor-name"));
static VENDOR_FALLBACK: LazyLock<Selector> = LazyLock::new(|| css("[class*=seller]"));
static IMG: LazyLock<Selector> = LazyLock::new(|| css("img"));

/// Reviews this short are rating widgets or placeholders, not review text.
const MIN_REVIEW_CHARS: usize = 11;

/// Extracts an [`EnrichedRecord`] from a fetched detail page.
///
/// Only images hosted on `asset_host` (or one of its subdomains) are kept.
/// The returned status is [`CrawlStatus::Ok`] when a name or a price was
/// found, otherwise [`CrawlStatus::Partial`]. Identity fields
/// (`source_id`, `link`, `source_query`) are left empty for the caller to
/// merge in.
#[must_use]
pub fn extract_detail(html: &str, detail_url: &str, asset_host: &str) -> EnrichedRecord {
    let doc = Html::parse_document(html);

    let name = first_text(&doc, &NAME)
        .or_else(|| meta_content(&doc, "og:title"))
        .unwrap_or_default();

    let price = first_text(&doc, &PRICE)
        .map(|text| parse_price(&text))
        .filter(|price| *price > 0)
        .or_else(|| meta_content(&doc, "product:price:amount").map(|text| parse_price(&text)))
        .unwrap_or(0);

    let description = first_text(&doc, &DESCRIPTION)
        .or_else(|| meta_content(&doc, "description"))
        .unwrap_or_default();

    let rating = first_text(&doc, &RATING)
        .map(|text| parse_rating(&text))
        .filter(|rating| *rating > 0.0)
        .or_else(|| {
            doc.select(&RATING_FALLBACK)
                .map(|el| parse_rating(&visible_text(el)))
                .find(|rating| *rating > 0.0)
        })
        .unwrap_or(0.0);

    let vendor_name = first_text(&doc, &VENDOR)
        .or_else(|| first_text(&doc, &VENDOR_FALLBACK))
        .unwrap_or_default();

    let image_url = meta_content(&doc, "og:image")
        .filter(|url| is_asset_url(url, asset_host));

    let crawl_status = if name.is_empty() && price == 0 {
        CrawlStatus::Partial
    } else {
        CrawlStatus::Ok
    };

    let mut record = EnrichedRecord::empty(detail_url, crawl_status);
    record.name = name;
    record.price = price;
    record.image_url = image_url;
    record.rating = rating;
    record.vendor_name = vendor_name;
    record.description = description;
    record.specifications = extract_specifications(&doc);
    record.reviews = extract_reviews(&doc);
    record.additional_images = extract_images(&doc, asset_host);
    record
}

fn extract_specifications(doc: &Html) -> BTreeMap<String, String> {
    let specs: BTreeMap<String, String> = doc
        .select(&SPEC_ITEM)
        .filter_map(|item| {
            let key = item.select(&SPEC_KEY).next().map(visible_text)?;
            let value = item.select(&SPEC_VALUE).next().map(visible_text)?;
            spec_pair(key, value)
        })
        .collect();
    if !specs.is_empty() {
        return specs;
    }

    doc.select(&SPEC_ROW)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&TD).map(visible_text).collect();
            match <[String; 2]>::try_from(cells) {
                Ok([key, value]) => spec_pair(key, value),
                Err(_) => None,
            }
        })
        .collect()
}

fn spec_pair(key: String, value: String) -> Option<(String, String)> {
    let key = key.trim_end_matches(':').trim().to_owned();
    if key.is_empty() || value.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

fn extract_reviews(doc: &Html) -> Vec<String> {
    let collect = |selector: &Selector| -> Vec<String> {
        doc.select(selector)
            .map(visible_text)
            .filter(|text| text.chars().count() >= MIN_REVIEW_CHARS)
            .take(MAX_REVIEWS)
            .collect()
    };

    let reviews = collect(&*REVIEW);
    if reviews.is_empty() {
        collect(&*REVIEW_FALLBACK)
    } else {
        reviews
    }
}

fn extract_images(doc: &Html, asset_host: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.select(&IMG)
        .flat_map(|img| [attr(img, "src"), attr(img, "data-src")])
        .flatten()
        .filter(|url| is_asset_url(url, asset_host))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Whether `url` is an absolute http(s) URL on `asset_host` or a subdomain.
pub(crate) fn is_asset_url(url: &str, asset_host: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let asset_host = asset_host.trim().trim_start_matches('.').to_ascii_lowercase();
    if asset_host.is_empty() {
        return false;
    }
    parsed.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        host == asset_host || host.ends_with(&format!(".{asset_host}"))
    })
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
