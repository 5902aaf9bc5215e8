//! Detail-page fetching and enrichment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scout_core::EnrichedRecord;

use crate::client::extract_origin;
use crate::error::ScraperError;
use crate::extract::extract_detail;

/// Produces an [`EnrichedRecord`] from a resolved detail-page URL.
///
/// Enrichment is infallible at this boundary: transport failures become a
/// record with `crawl_status = failed` and extraction gaps become zero
/// values.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, detail_url: &str) -> EnrichedRecord;
}

/// Fetches marketplace product pages over HTTP and extracts their fields.
#[derive(Debug, Clone)]
pub struct DetailEnricher {
    client: Client,
    asset_host: String,
}

impl DetailEnricher {
    /// Creates a `DetailEnricher`.
    ///
    /// `asset_host` is the host suffix that images must belong to in order
    /// to be kept (e.g. `basalam.com`).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        asset_host: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            asset_host: asset_host.to_owned(),
        })
    }

    /// Fetches the raw HTML of `url`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Timeout`] when the request exceeds the client timeout.
    /// - [`ScraperError::NotFound`] on HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on other network or TLS failures.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "fa-IR,fa;q=0.9,en;q=0.8")
            .header(reqwest::header::REFERER, extract_origin(url))
            .send()
            .await
            .map_err(|e| ScraperError::from_request(e, url))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ScraperError::from_request(e, url))
    }
}

#[async_trait]
impl Enricher for DetailEnricher {
    async fn enrich(&self, detail_url: &str) -> EnrichedRecord {
        match self.fetch_page(detail_url).await {
            Ok(html) => {
                let record = extract_detail(&html, detail_url, &self.asset_host);
                tracing::debug!(
                    url = detail_url,
                    status = %record.crawl_status,
                    specs = record.specifications.len(),
                    reviews = record.reviews.len(),
                    images = record.additional_images.len(),
                    "detail page enriched"
                );
                record
            }
            Err(e) => {
                tracing::warn!(url = detail_url, error = %e, "detail fetch failed");
                EnrichedRecord::failed(detail_url, e.to_string())
            }
        }
    }
}
