//! End-to-end discovery: aggregate, enrich the cheapest candidates, persist.
//!
//! One run never fails because of a single candidate. Candidates without a
//! resolvable detail page are skipped, failed enrichments are not saved, and
//! save errors are logged and recorded in the [`PipelineReport`].

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use scout_core::{
    AppConfig, CrawlStatus, EnrichedRecord, IdentifierMapping, ListingRecord, SearchFilters,
};
use scout_db::CatalogStore;
use scout_scraper::{resolve_detail_url, Enricher, ListingSearch};
use uuid::Uuid;

use crate::aggregator::{Aggregation, Aggregator};
use crate::error::DiscoveryError;
use crate::expander::QueryExpander;

/// Bounds for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// How many of the cheapest candidates are enriched and saved.
    pub max_candidates_to_enrich: usize,
    /// How many expansion components the aggregator searches.
    pub max_expansion_components: usize,
    /// Applied to every search sub-call and every detail fetch.
    pub per_call_timeout: Duration,
    /// Maximum simultaneous detail fetches.
    pub enrichment_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_candidates_to_enrich: 5,
            max_expansion_components: 5,
            per_call_timeout: Duration::from_secs(15),
            enrichment_concurrency: 5,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_candidates_to_enrich: config.max_candidates_to_enrich,
            max_expansion_components: config.max_expansion_components,
            per_call_timeout: config.per_call_timeout(),
            enrichment_concurrency: config.enrichment_concurrency,
        }
    }
}

/// Terminal state of one candidate within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// No detail URL could be resolved, or the listing has no vendor.
    Skipped { reason: String },
    /// The detail fetch failed or timed out; nothing was saved.
    EnrichmentFailed { error: String },
    /// Enrichment succeeded but the catalog rejected the write.
    SaveFailed { error: String },
    Saved { internal_id: Uuid },
}

impl CandidateOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::EnrichmentFailed { .. } => "enrichment_failed",
            Self::SaveFailed { .. } => "save_failed",
            Self::Saved { .. } => "saved",
        }
    }
}

/// One enriched candidate and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReport {
    pub source_id: String,
    pub name: String,
    pub outcome: CandidateOutcome,
}

/// Result of one discovery run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// The full aggregation, including the pre-enrichment candidate pool.
    pub aggregation: Aggregation,
    /// `source_id → internal_id` for every candidate that was saved.
    pub mapping: IdentifierMapping,
    /// One entry per enriched candidate, in candidate order.
    pub outcomes: Vec<CandidateReport>,
}

impl PipelineReport {
    /// The price-sorted candidate pool, available even when every
    /// enrichment failed.
    #[must_use]
    pub fn candidates(&self) -> &[ListingRecord] {
        &self.aggregation.candidates
    }

    #[must_use]
    pub fn saved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, CandidateOutcome::Saved { .. }))
            .count()
    }
}

/// Drives aggregation, enrichment and persistence for one query.
#[derive(Clone)]
pub struct DiscoveryPipeline {
    aggregator: Aggregator,
    enricher: Arc<dyn Enricher>,
    store: Arc<dyn CatalogStore>,
    config: PipelineConfig,
}

impl DiscoveryPipeline {
    #[must_use]
    pub fn new(
        search: Arc<dyn ListingSearch>,
        expander: Arc<dyn QueryExpander>,
        enricher: Arc<dyn Enricher>,
        store: Arc<dyn CatalogStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(
                search,
                expander,
                config.max_expansion_components,
                config.per_call_timeout,
            ),
            enricher,
            store,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs discovery for `query`.
    ///
    /// The first `max_candidates_to_enrich` candidates are enriched with at
    /// most `enrichment_concurrency` fetches in flight. Every saved record
    /// is tagged with `query` as its source query.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] or
    /// [`DiscoveryError::SearchTimedOut`] only when the original-query search
    /// fails. All per-candidate failures are absorbed into the report.
    pub async fn run(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<PipelineReport, DiscoveryError> {
        let aggregation = self.aggregator.run(query, filters).await?;

        let outcomes: Vec<CandidateReport> = stream::iter(
            aggregation
                .candidates
                .iter()
                .take(self.config.max_candidates_to_enrich),
        )
        .map(|listing| self.process_candidate(listing, query))
        .buffered(self.config.enrichment_concurrency.max(1))
        .collect()
        .await;

        let mut mapping = IdentifierMapping::new();
        for report in &outcomes {
            if let CandidateOutcome::Saved { internal_id } = report.outcome {
                if !report.source_id.is_empty() {
                    mapping.insert(report.source_id.clone(), internal_id);
                }
            }
        }

        let report = PipelineReport {
            aggregation,
            mapping,
            outcomes,
        };

        tracing::info!(
            query,
            candidates = report.candidates().len(),
            attempted = report.outcomes.len(),
            saved = report.saved_count(),
            "discovery pipeline complete"
        );

        Ok(report)
    }

    async fn process_candidate(&self, listing: &ListingRecord, query: &str) -> CandidateReport {
        let outcome = self.enrich_and_save(listing, query).await;
        CandidateReport {
            source_id: listing.source_id.clone(),
            name: listing.name.clone(),
            outcome,
        }
    }

    async fn enrich_and_save(&self, listing: &ListingRecord, query: &str) -> CandidateOutcome {
        if listing.vendor_name.trim().is_empty() {
            tracing::warn!(source_id = %listing.source_id, "skipping candidate without vendor name");
            return CandidateOutcome::Skipped {
                reason: "missing vendor name".to_string(),
            };
        }
        let Some(detail_url) = resolve_detail_url(&listing.link, &listing.vendor_name) else {
            tracing::warn!(
                source_id = %listing.source_id,
                link = %listing.link,
                "skipping candidate with unresolvable detail url"
            );
            return CandidateOutcome::Skipped {
                reason: format!("unresolvable link \"{}\"", listing.link),
            };
        };

        let enriched =
            match tokio::time::timeout(self.config.per_call_timeout, self.enricher.enrich(&detail_url))
                .await
            {
                Ok(record) => record,
                Err(_) => EnrichedRecord::failed(
                    &detail_url,
                    format!(
                        "detail fetch timed out after {}s",
                        self.config.per_call_timeout.as_secs()
                    ),
                ),
            };

        if enriched.crawl_status == CrawlStatus::Failed {
            let error = enriched
                .crawl_error
                .unwrap_or_else(|| "enrichment failed".to_string());
            tracing::warn!(
                source_id = %listing.source_id,
                url = %detail_url,
                error = %error,
                "enrichment failed, candidate not saved"
            );
            return CandidateOutcome::EnrichmentFailed { error };
        }

        let record = enriched.merged_over(listing, query);
        match self.store.save(&record, query).await {
            Ok(internal_id) => {
                tracing::debug!(
                    source_id = %listing.source_id,
                    internal_id = %internal_id,
                    crawl_status = %record.crawl_status,
                    "candidate saved"
                );
                CandidateOutcome::Saved { internal_id }
            }
            Err(e) => {
                tracing::warn!(
                    source_id = %listing.source_id,
                    error = %e,
                    "failed to save enriched candidate"
                );
                CandidateOutcome::SaveFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}
