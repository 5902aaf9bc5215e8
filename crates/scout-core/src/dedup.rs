//! Source-id deduplication shared by search aggregation.

use std::collections::HashSet;

use crate::products::ListingRecord;

/// Running set of marketplace `source_id`s already placed in a candidate pool.
///
/// Records with an empty `source_id` have no natural key and are never
/// treated as duplicates.
#[derive(Debug, Default, Clone)]
pub struct SeenSourceIds {
    seen: HashSet<String>,
}

impl SeenSourceIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every id in `records` as seen without filtering anything.
    pub fn mark_all(&mut self, records: &[ListingRecord]) {
        for record in records {
            if !record.source_id.is_empty() {
                self.seen.insert(record.source_id.clone());
            }
        }
    }

    /// Keeps only records whose `source_id` has not been seen yet, marking
    /// the survivors as seen. Duplicates within `records` itself are
    /// dropped too; the first occurrence wins.
    pub fn retain_unseen(&mut self, records: Vec<ListingRecord>) -> Vec<ListingRecord> {
        records
            .into_iter()
            .filter(|record| {
                record.source_id.is_empty() || self.seen.insert(record.source_id.clone())
            })
            .collect()
    }

    #[must_use]
    pub fn contains(&self, source_id: &str) -> bool {
        self.seen.contains(source_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
