//! HTTP client for the marketplace product-search endpoint.

mod origin;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scout_core::{ListingRecord, SearchFilters};

use crate::error::ScraperError;
use crate::normalize::{apply_contract, normalize_listing};
use crate::types::SearchResponse;

use origin::extract_domain;
pub use origin::{extract_origin, resolve_detail_url};

/// A keyword search against the marketplace.
///
/// Implementations return records that already satisfy the listing
/// contract: no zero prices, filters applied, ascending by price.
#[async_trait]
pub trait ListingSearch: Send + Sync {
    /// Searches for `query` with optional `filters`.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] on transport failure, timeout, or an
    /// unparseable response. An empty result set is not an error.
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ListingRecord>, ScraperError>;
}

/// Client for the marketplace's JSON product-search API.
///
/// Filters are sent as query parameters and re-applied locally, since the
/// endpoint does not reliably honour them.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    endpoint: String,
    marketplace_base_url: String,
}

impl SearchClient {
    /// Creates a `SearchClient` with a per-request timeout and `User-Agent`.
    ///
    /// `marketplace_base_url` is the origin used to build listing links
    /// (`<base>/p/<id>`).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `endpoint` is not an absolute
    /// URL, or [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        endpoint: &str,
        marketplace_base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        reqwest::Url::parse(endpoint).map_err(|e| ScraperError::InvalidUrl {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            marketplace_base_url: marketplace_base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Builds the request URL for `query` and `filters`.
    ///
    /// Only filters that are set become query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the endpoint cannot be parsed.
    pub(crate) fn search_url(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<String, ScraperError> {
        let mut url =
            reqwest::Url::parse(&self.endpoint).map_err(|e| ScraperError::InvalidUrl {
                url: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if let Some(max_price) = filters.max_price {
                pairs.append_pair("max_price", &max_price.to_string());
            }
            if let Some(min_rating) = filters.min_rating {
                pairs.append_pair("min_rating", &min_rating.to_string());
            }
            if let Some(city) = filters
                .vendor_city
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                pairs.append_pair("vendor_city", city);
            }
        }

        Ok(url.into())
    }
}

#[async_trait]
impl ListingSearch for SearchClient {
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ListingRecord>, ScraperError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScraperError::EmptyQuery);
        }

        let url = self.search_url(query, filters)?;
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ScraperError::from_request(e, &url))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound { url });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScraperError::from_request(e, &url))?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
                context: format!("search response for \"{query}\""),
                source,
            })?;

        let raw_count = parsed.products.len();
        let records: Vec<ListingRecord> = parsed
            .into_products()
            .into_iter()
            .map(|product| normalize_listing(product, &self.marketplace_base_url))
            .collect();
        let records = apply_contract(records, filters);

        tracing::debug!(
            query,
            host = %extract_domain(&url),
            raw_count,
            kept = records.len(),
            "search completed"
        );

        Ok(records)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
