//! Caller-facing surface of the discovery core.

use std::sync::Arc;

use scout_core::{CatalogEntry, ComparisonResult, SearchFilters};
use scout_db::CatalogStore;
use uuid::Uuid;

use crate::error::DiscoveryError;
use crate::pipeline::{DiscoveryPipeline, PipelineReport};

/// Entries beyond this many ids are ignored by [`DiscoveryService::compare_entries`].
pub const MAX_COMPARED: usize = 3;

/// Fewest resolvable entries a comparison needs.
pub const MIN_COMPARED: usize = 2;

/// Runs discovery and serves reads from the catalog it writes to.
#[derive(Clone)]
pub struct DiscoveryService {
    pipeline: DiscoveryPipeline,
    store: Arc<dyn CatalogStore>,
}

impl DiscoveryService {
    /// `store` should be the same catalog the pipeline saves into.
    #[must_use]
    pub fn new(pipeline: DiscoveryPipeline, store: Arc<dyn CatalogStore>) -> Self {
        Self { pipeline, store }
    }

    /// # Errors
    ///
    /// Fails only when the original-query search fails; see
    /// [`DiscoveryPipeline::run`].
    pub async fn run_discovery_pipeline(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<PipelineReport, DiscoveryError> {
        self.pipeline.run(query, filters).await
    }

    /// # Errors
    ///
    /// Returns [`DiscoveryError::NotFound`] when no entry has `internal_id`,
    /// or [`DiscoveryError::Persistence`] on store failure.
    pub async fn get_entry(&self, internal_id: Uuid) -> Result<CatalogEntry, DiscoveryError> {
        self.store
            .get(internal_id)
            .await?
            .ok_or(DiscoveryError::NotFound { internal_id })
    }

    /// Compares up to the first three of `internal_ids`.
    ///
    /// Ids that resolve to nothing are dropped before the count check.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InsufficientInput`] when fewer than two ids
    /// resolve, or [`DiscoveryError::Persistence`] on store failure.
    pub async fn compare_entries(
        &self,
        internal_ids: &[Uuid],
    ) -> Result<ComparisonResult, DiscoveryError> {
        let mut entries = Vec::with_capacity(MAX_COMPARED);
        for &internal_id in internal_ids.iter().take(MAX_COMPARED) {
            match self.store.get(internal_id).await? {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::debug!(internal_id = %internal_id, "comparison id not found, dropping");
                }
            }
        }

        let resolved = entries.len();
        ComparisonResult::from_entries(entries).ok_or(DiscoveryError::InsufficientInput {
            resolved,
            required: MIN_COMPARED,
        })
    }

    /// # Errors
    ///
    /// Returns [`DiscoveryError::Persistence`] on store failure.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<CatalogEntry>, DiscoveryError> {
        Ok(self.store.list_recent(limit).await?)
    }

    /// # Errors
    ///
    /// Returns [`DiscoveryError::Persistence`] on store failure.
    pub async fn search_stored(&self, text: &str) -> Result<Vec<CatalogEntry>, DiscoveryError> {
        Ok(self.store.search_text(text).await?)
    }

    /// Entries saved by runs of exactly `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Persistence`] on store failure.
    pub async fn entries_for_query(
        &self,
        query: &str,
    ) -> Result<Vec<CatalogEntry>, DiscoveryError> {
        Ok(self.store.list_by_search_tag(query).await?)
    }

    /// # Errors
    ///
    /// Returns [`DiscoveryError::NotFound`] when no entry has `internal_id`,
    /// or [`DiscoveryError::Persistence`] on store failure.
    pub async fn delete_entry(&self, internal_id: Uuid) -> Result<(), DiscoveryError> {
        if self.store.delete(internal_id).await? {
            tracing::info!(internal_id = %internal_id, "catalog entry deleted");
            Ok(())
        } else {
            Err(DiscoveryError::NotFound { internal_id })
        }
    }
}
