pub mod client;
pub mod enrich;
pub mod error;
pub mod extract;
mod html;
pub mod normalize;
pub mod parse;
pub mod types;

pub use client::{extract_origin, resolve_detail_url, ListingSearch, SearchClient};
pub use enrich::{DetailEnricher, Enricher};
pub use error::ScraperError;
pub use extract::extract_detail;
pub use normalize::{apply_contract, normalize_listing};
pub use types::{SearchProduct, SearchResponse};
