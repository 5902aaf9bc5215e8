//! In-memory [`CatalogStore`] for tests and offline runs.
//!
//! Entries live in a `HashMap` behind `std::sync::RwLock`. A secondary index
//! maps non-empty `source_id`s to internal ids so saves behave as upserts,
//! matching the partial unique index of the Postgres schema.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use scout_core::{CatalogEntry, EnrichedRecord};
use uuid::Uuid;

use super::CatalogStore;
use crate::CatalogError;

struct StoredEntry {
    entry: CatalogEntry,
    /// Insertion sequence; breaks `created_at` ties so ordering is total.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Uuid, StoredEntry>,
    by_source_id: HashMap<String, Uuid>,
    next_seq: u64,
}

/// In-memory catalog store.
#[derive(Default)]
pub struct MemoryCatalogStore {
    inner: RwLock<Inner>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(|inner| inner.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Entries matching `predicate`, newest first.
    fn collect_sorted(&self, predicate: impl Fn(&CatalogEntry) -> bool) -> Vec<CatalogEntry> {
        self.read(|inner| {
            let mut matched: Vec<&StoredEntry> = inner
                .entries
                .values()
                .filter(|stored| predicate(&stored.entry))
                .collect();
            matched.sort_by(|a, b| {
                b.entry
                    .created_at
                    .cmp(&a.entry.created_at)
                    .then(b.seq.cmp(&a.seq))
            });
            matched.into_iter().map(|s| s.entry.clone()).collect()
        })
    }
}

/// A timestamp strictly after `previous`, so updates always advance
/// `updated_at` even on coarse clocks.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous + Duration::microseconds(1))
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn save(
        &self,
        record: &EnrichedRecord,
        source_query: &str,
    ) -> Result<Uuid, CatalogError> {
        let mut record = record.clone();
        record.source_query = source_query.to_owned();

        let id = self.write(|inner| {
            let existing = if record.source_id.is_empty() {
                None
            } else {
                inner.by_source_id.get(&record.source_id).copied()
            };

            if let Some(stored) = existing.and_then(|id| inner.entries.get_mut(&id)) {
                stored.entry.updated_at = advance(stored.entry.updated_at);
                stored.entry.record = record;
                return stored.entry.internal_id;
            }

            let id = Uuid::new_v4();
            let now = Utc::now();
            if !record.source_id.is_empty() {
                inner.by_source_id.insert(record.source_id.clone(), id);
            }
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.entries.insert(
                id,
                StoredEntry {
                    entry: CatalogEntry {
                        internal_id: id,
                        record,
                        created_at: now,
                        updated_at: now,
                    },
                    seq,
                },
            );
            id
        });

        Ok(id)
    }

    async fn get(&self, internal_id: Uuid) -> Result<Option<CatalogEntry>, CatalogError> {
        Ok(self.read(|inner| {
            inner
                .entries
                .get(&internal_id)
                .map(|stored| stored.entry.clone())
        }))
    }

    async fn list_by_search_tag(
        &self,
        source_query: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.collect_sorted(|entry| entry.record.source_query == source_query))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut entries = self.collect_sorted(|_| true);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn search_text(&self, text: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let needle = text.trim().to_lowercase();
        Ok(self.collect_sorted(|entry| {
            entry.record.name.to_lowercase().contains(&needle)
                || entry.record.description.to_lowercase().contains(&needle)
        }))
    }

    async fn delete(&self, internal_id: Uuid) -> Result<bool, CatalogError> {
        Ok(self.write(|inner| {
            let Some(stored) = inner.entries.remove(&internal_id) else {
                return false;
            };
            let source_id = &stored.entry.record.source_id;
            if !source_id.is_empty() {
                inner.by_source_id.remove(source_id);
            }
            true
        }))
    }
}
