//! Shared types and configuration for the scout workspace.

pub mod app_config;
pub mod config;
pub mod dedup;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, LlmConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use dedup::SeenSourceIds;
pub use products::{
    CatalogEntry, ComparisonResult, CrawlStatus, EnrichedRecord, IdentifierMapping,
    ListingRecord, PriceSummary, SearchFilters, MAX_REVIEWS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
