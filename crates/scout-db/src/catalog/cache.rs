//! Read-through cache in front of a [`CatalogStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use scout_core::{CatalogEntry, EnrichedRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::CatalogStore;
use crate::CatalogError;

/// Caches [`CatalogStore::get`] results by internal id.
///
/// The wrapped store stays the only writer and does its own serialization;
/// no cache lock is held across its I/O. `save` and `delete` evict the
/// affected id and bump a generation counter once the write lands. A miss
/// records the generation before reading through and only fills the cache if
/// no write finished in between, so a slow read never caches a stale entry.
/// List and search operations are never cached.
pub struct CachedCatalog<S> {
    inner: S,
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Uuid, CatalogEntry>,
    generation: u64,
}

impl<S: CatalogStore> CachedCatalog<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached entries.
    pub async fn cached_len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    async fn invalidate(&self, internal_id: Uuid) {
        let mut state = self.state.write().await;
        state.generation = state.generation.wrapping_add(1);
        if state.entries.remove(&internal_id).is_some() {
            tracing::debug!(%internal_id, "catalog cache invalidated");
        }
    }
}

#[async_trait]
impl<S: CatalogStore> CatalogStore for CachedCatalog<S> {
    async fn save(
        &self,
        record: &EnrichedRecord,
        source_query: &str,
    ) -> Result<Uuid, CatalogError> {
        let id = self.inner.save(record, source_query).await?;
        self.invalidate(id).await;
        Ok(id)
    }

    async fn get(&self, internal_id: Uuid) -> Result<Option<CatalogEntry>, CatalogError> {
        let generation = {
            let state = self.state.read().await;
            if let Some(entry) = state.entries.get(&internal_id) {
                tracing::debug!(%internal_id, "catalog cache hit");
                return Ok(Some(entry.clone()));
            }
            state.generation
        };

        tracing::debug!(%internal_id, "catalog cache miss");
        let entry = self.inner.get(internal_id).await?;
        if let Some(entry) = &entry {
            let mut state = self.state.write().await;
            if state.generation == generation {
                state.entries.insert(internal_id, entry.clone());
            } else {
                tracing::debug!(%internal_id, "catalog cache fill skipped after concurrent write");
            }
        }
        Ok(entry)
    }

    async fn list_by_search_tag(
        &self,
        source_query: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.inner.list_by_search_tag(source_query).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.inner.list_recent(limit).await
    }

    async fn search_text(&self, text: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.inner.search_text(text).await
    }

    async fn delete(&self, internal_id: Uuid) -> Result<bool, CatalogError> {
        let deleted = self.inner.delete(internal_id).await?;
        self.invalidate(internal_id).await;
        Ok(deleted)
    }
}
