//! Candidate-pool aggregation across the original query and its expansion.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use scout_core::{ListingRecord, SearchFilters, SeenSourceIds};
use scout_scraper::{ListingSearch, ScraperError};
use thiserror::Error;

use crate::error::DiscoveryError;
use crate::expander::{Expansion, QueryExpander};

/// How many records one expansion component added to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentContribution {
    pub component: String,
    /// Records not already contributed by the original query or an earlier
    /// component.
    pub new_records: usize,
}

/// An expansion component whose sub-search failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFailure {
    pub component: String,
    pub error: String,
}

/// The deduplicated, price-sorted candidate pool for one query.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Ascending by price; equal prices keep discovery order.
    pub candidates: Vec<ListingRecord>,
    /// Components that were searched, in expander order.
    pub components: Vec<String>,
    pub strategy: String,
    /// Records returned by the original query.
    pub original_count: usize,
    pub contributions: Vec<ComponentContribution>,
    pub failures: Vec<ComponentFailure>,
}

/// Fans one query out over its expansion components and merges the results.
#[derive(Clone)]
pub struct Aggregator {
    search: Arc<dyn ListingSearch>,
    expander: Arc<dyn QueryExpander>,
    max_components: usize,
    per_call_timeout: Duration,
}

#[derive(Debug, Error)]
enum SubSearchError {
    #[error(transparent)]
    Search(ScraperError),
    #[error("timed out")]
    TimedOut,
}

impl Aggregator {
    #[must_use]
    pub fn new(
        search: Arc<dyn ListingSearch>,
        expander: Arc<dyn QueryExpander>,
        max_components: usize,
        per_call_timeout: Duration,
    ) -> Self {
        Self {
            search,
            expander,
            max_components,
            per_call_timeout,
        }
    }

    /// Builds the candidate pool for `query`.
    ///
    /// The expander and the original search run concurrently. Component
    /// sub-searches run concurrently with each other, bounded by the number
    /// of components, and are merged in expander order so an earlier
    /// component wins a duplicate `source_id` over a later one. The original
    /// query's results are never dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Transport`] or
    /// [`DiscoveryError::SearchTimedOut`] only when the original-query search
    /// fails. Expander and component failures are absorbed.
    pub async fn run(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Aggregation, DiscoveryError> {
        let (expansion, original) =
            tokio::join!(self.expand(query), self.search_once(query, filters));

        let original = original.map_err(|e| match e {
            SubSearchError::Search(source) => DiscoveryError::Transport {
                query: query.to_owned(),
                source,
            },
            SubSearchError::TimedOut => DiscoveryError::SearchTimedOut {
                query: query.to_owned(),
                secs: self.per_call_timeout.as_secs(),
            },
        })?;

        let components: Vec<String> = expansion
            .components
            .into_iter()
            .take(self.max_components)
            .collect();

        let original_count = original.len();
        let mut seen = SeenSourceIds::new();
        seen.mark_all(&original);
        let mut pool = original;

        let sub_results: Vec<(String, Result<Vec<ListingRecord>, SubSearchError>)> =
            stream::iter(components.iter().cloned())
                .map(|component| async move {
                    let result = self.search_once(&component, filters).await;
                    (component, result)
                })
                .buffered(components.len().max(1))
                .collect()
                .await;

        let mut contributions = Vec::new();
        let mut failures = Vec::new();
        for (component, result) in sub_results {
            match result {
                Ok(records) => {
                    let fresh = seen.retain_unseen(records);
                    tracing::debug!(
                        query,
                        component = %component,
                        new_records = fresh.len(),
                        "component search merged"
                    );
                    contributions.push(ComponentContribution {
                        component,
                        new_records: fresh.len(),
                    });
                    pool.extend(fresh);
                }
                Err(e) => {
                    tracing::warn!(
                        query,
                        component = %component,
                        error = %e,
                        "component search failed, skipping"
                    );
                    failures.push(ComponentFailure {
                        component,
                        error: e.to_string(),
                    });
                }
            }
        }

        pool.sort_by_key(|record| record.price);

        tracing::info!(
            query,
            original = original_count,
            components = components.len(),
            failed_components = failures.len(),
            candidates = pool.len(),
            "aggregation complete"
        );

        Ok(Aggregation {
            candidates: pool,
            components,
            strategy: expansion.strategy,
            original_count,
            contributions,
            failures,
        })
    }

    async fn expand(&self, query: &str) -> Expansion {
        match tokio::time::timeout(self.per_call_timeout, self.expander.expand(query)).await {
            Ok(Ok(expansion)) => expansion,
            Ok(Err(e)) => {
                tracing::warn!(query, error = %e, "query expansion failed, using original query only");
                Expansion::empty()
            }
            Err(_) => {
                tracing::warn!(query, "query expansion timed out, using original query only");
                Expansion::empty()
            }
        }
    }

    async fn search_once(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ListingRecord>, SubSearchError> {
        match tokio::time::timeout(self.per_call_timeout, self.search.search(query, filters)).await
        {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(e)) => Err(SubSearchError::Search(e)),
            Err(_) => Err(SubSearchError::TimedOut),
        }
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
