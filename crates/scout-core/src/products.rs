use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lightweight listing returned by the marketplace search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Marketplace identifier for the listing, e.g. `"16078271"`. Opaque;
    /// may be empty when the search response omitted it.
    pub source_id: String,
    pub name: String,
    /// Price in the marketplace's smallest currency unit.
    pub price: u64,
    pub image_url: Option<String>,
    /// Average rating in `0.0..=5.0`, when the listing has been rated.
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub vendor_name: String,
    pub vendor_city: Option<String>,
    /// Canonical or short listing URL, e.g. `"https://basalam.com/p/16078271"`.
    pub link: String,
}

/// Caller-supplied search filters, forwarded unchanged to every sub-search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub max_price: Option<u64>,
    pub min_rating: Option<f64>,
    pub vendor_city: Option<String>,
}

impl SearchFilters {
    /// Returns `true` if `record` passes every configured filter.
    ///
    /// Zero-priced records never pass. A missing rating fails a `min_rating`
    /// filter, but a missing vendor city passes a `vendor_city` filter.
    #[must_use]
    pub fn accepts(&self, record: &ListingRecord) -> bool {
        if record.price == 0 {
            return false;
        }
        if self.max_price.is_some_and(|max| record.price > max) {
            return false;
        }
        if let Some(min) = self.min_rating {
            match record.rating {
                Some(rating) if rating >= min => {}
                _ => return false,
            }
        }
        if let (Some(wanted), Some(city)) = (&self.vendor_city, &record.vendor_city) {
            if city.trim().to_lowercase() != wanted.trim().to_lowercase() {
                return false;
            }
        }
        true
    }
}

/// Outcome of one detail-page enrichment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Page fetched and at least the name or price was extracted.
    Ok,
    /// Page fetched but no structured field could be extracted.
    Partial,
    /// The fetch itself failed; the record carries only the URL and error.
    Failed,
}

impl CrawlStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrawlStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown crawl status \"{other}\"")),
        }
    }
}

/// A listing enriched with data scraped from its detail page.
///
/// Extraction gaps are represented by zero values: empty strings, `0`,
/// `0.0`, and empty containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub source_id: String,
    pub name: String,
    pub price: u64,
    pub image_url: Option<String>,
    /// `0.0` when no rating was found on the page or in the listing.
    pub rating: f64,
    pub rating_count: u64,
    pub vendor_name: String,
    pub vendor_city: Option<String>,
    pub link: String,
    /// The detail-page URL that was fetched.
    pub detail_url: String,
    pub description: String,
    pub specifications: BTreeMap<String, String>,
    /// Full review texts, at most [`MAX_REVIEWS`].
    pub reviews: Vec<String>,
    /// Distinct marketplace-hosted image URLs in page order.
    pub additional_images: Vec<String>,
    pub crawl_status: CrawlStatus,
    /// Set only when `crawl_status` is [`CrawlStatus::Failed`].
    pub crawl_error: Option<String>,
    /// The user query that discovered this listing.
    pub source_query: String,
}

/// Maximum number of reviews kept per enriched record.
pub const MAX_REVIEWS: usize = 5;

impl EnrichedRecord {
    /// An empty record for `detail_url` with the given status.
    #[must_use]
    pub fn empty(detail_url: &str, crawl_status: CrawlStatus) -> Self {
        Self {
            source_id: String::new(),
            name: String::new(),
            price: 0,
            image_url: None,
            rating: 0.0,
            rating_count: 0,
            vendor_name: String::new(),
            vendor_city: None,
            link: String::new(),
            detail_url: detail_url.to_owned(),
            description: String::new(),
            specifications: BTreeMap::new(),
            reviews: Vec::new(),
            additional_images: Vec::new(),
            crawl_status,
            crawl_error: None,
            source_query: String::new(),
        }
    }

    /// A failed enrichment: only the URL and the error description are set.
    #[must_use]
    pub fn failed(detail_url: &str, error: impl Into<String>) -> Self {
        let mut record = Self::empty(detail_url, CrawlStatus::Failed);
        record.crawl_error = Some(error.into());
        record
    }

    /// Merges this record over `listing`.
    ///
    /// Fields extracted from the detail page win whenever they carry a
    /// value; extraction gaps fall back to the listing's value. Identity
    /// fields (`source_id`, `link`) always come from the listing.
    #[must_use]
    pub fn merged_over(self, listing: &ListingRecord, source_query: &str) -> Self {
        fn prefer(extracted: String, fallback: &str) -> String {
            if extracted.trim().is_empty() {
                fallback.to_owned()
            } else {
                extracted
            }
        }

        Self {
            source_id: listing.source_id.clone(),
            name: prefer(self.name, &listing.name),
            price: if self.price > 0 { self.price } else { listing.price },
            image_url: self.image_url.or_else(|| listing.image_url.clone()),
            rating: if self.rating > 0.0 {
                self.rating
            } else {
                listing.rating.unwrap_or(0.0)
            },
            rating_count: if self.rating_count > 0 {
                self.rating_count
            } else {
                listing.rating_count.unwrap_or(0)
            },
            vendor_name: prefer(self.vendor_name, &listing.vendor_name),
            vendor_city: self.vendor_city.or_else(|| listing.vendor_city.clone()),
            link: listing.link.clone(),
            detail_url: self.detail_url,
            description: self.description,
            specifications: self.specifications,
            reviews: self.reviews,
            additional_images: self.additional_images,
            crawl_status: self.crawl_status,
            crawl_error: self.crawl_error,
            source_query: source_query.to_owned(),
        }
    }
}

/// A persisted [`EnrichedRecord`] with store-assigned identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub internal_id: Uuid,
    pub record: EnrichedRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Price statistics across a compared set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub min_price: u64,
    pub max_price: u64,
    /// `max_price - min_price`.
    pub spread: u64,
}

/// Two or three catalog entries placed side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub entries: Vec<CatalogEntry>,
    pub summary: PriceSummary,
}

impl ComparisonResult {
    /// Builds a comparison, or `None` when fewer than two entries are given.
    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Option<Self> {
        if entries.len() < 2 {
            return None;
        }
        let prices = entries.iter().map(|e| e.record.price);
        let min_price = prices.clone().min()?;
        let max_price = prices.max()?;
        Some(Self {
            entries,
            summary: PriceSummary {
                min_price,
                max_price,
                spread: max_price - min_price,
            },
        })
    }

    #[must_use]
    pub fn ratings(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.record.rating).collect()
    }

    #[must_use]
    pub fn vendors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.record.vendor_name.as_str())
            .collect()
    }

    #[must_use]
    pub fn cities(&self) -> Vec<Option<&str>> {
        self.entries
            .iter()
            .map(|e| e.record.vendor_city.as_deref())
            .collect()
    }
}

/// `source_id -> internal_id` for every listing enriched and saved in one run.
pub type IdentifierMapping = BTreeMap<String, Uuid>;
