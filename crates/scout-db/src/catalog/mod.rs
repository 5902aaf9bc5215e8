//! Durable catalog of enriched listings.
//!
//! [`CatalogStore`] is the single source of truth. [`PgCatalogStore`] is the
//! production backend, [`MemoryCatalogStore`] backs tests and offline runs,
//! and [`CachedCatalog`] wraps either one with a read-through cache keyed by
//! internal id.

mod cache;
mod memory;
mod postgres;

use async_trait::async_trait;
use scout_core::{CatalogEntry, EnrichedRecord};
use uuid::Uuid;

use crate::CatalogError;

pub use cache::CachedCatalog;
pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

/// Default page size for [`CatalogStore::list_recent`] callers.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Persistence for [`EnrichedRecord`]s.
///
/// Saving is an upsert on non-empty `source_id`: the first save assigns an
/// internal id and `created_at`, later saves of the same `source_id` replace
/// every mutable field, keep the id and `created_at`, and advance
/// `updated_at`. Records with an empty `source_id` are always inserted as
/// new entries.
///
/// Every list operation returns entries newest first by `created_at`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts or updates `record`, tagging it with `source_query`.
    /// Returns the entry's internal id.
    async fn save(&self, record: &EnrichedRecord, source_query: &str)
        -> Result<Uuid, CatalogError>;

    /// Returns the entry with `internal_id`, or `None`.
    async fn get(&self, internal_id: Uuid) -> Result<Option<CatalogEntry>, CatalogError>;

    /// Entries discovered by exactly `source_query`.
    async fn list_by_search_tag(
        &self,
        source_query: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// At most `limit` most recently created entries.
    async fn list_recent(&self, limit: usize) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Case-insensitive substring match over name and description.
    async fn search_text(&self, text: &str) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Deletes the entry with `internal_id`. Returns whether it existed.
    async fn delete(&self, internal_id: Uuid) -> Result<bool, CatalogError>;
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
