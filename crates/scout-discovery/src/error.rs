use scout_db::CatalogError;
use scout_scraper::ScraperError;
use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced to callers of the discovery core.
///
/// Failures of individual expansion components, detail fetches, or saves are
/// absorbed into the run's report and never appear here.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("search for \"{query}\" failed: {source}")]
    Transport {
        query: String,
        #[source]
        source: ScraperError,
    },

    #[error("search for \"{query}\" timed out after {secs}s")]
    SearchTimedOut { query: String, secs: u64 },

    #[error("no catalog entry with id {internal_id}")]
    NotFound { internal_id: Uuid },

    #[error("comparison needs at least {required} stored entries, found {resolved}")]
    InsufficientInput { resolved: usize, required: usize },

    #[error("catalog error: {0}")]
    Persistence(#[from] CatalogError),
}

/// Failures of the LLM-backed query expander.
///
/// These never fail a discovery run; the aggregator logs them and proceeds
/// with the original query alone.
#[derive(Debug, Error)]
pub enum ExpanderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("expansion endpoint returned HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("malformed expansion response: {0}")]
    MalformedResponse(String),
}
