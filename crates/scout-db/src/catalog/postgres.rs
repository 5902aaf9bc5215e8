//! Postgres-backed [`CatalogStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scout_core::{CatalogEntry, CrawlStatus, EnrichedRecord};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::CatalogStore;
use crate::CatalogError;

const SELECT_COLUMNS: &str = "id, source_id, name, price, image_url, rating, rating_count, \
     vendor_name, vendor_city, link, detail_url, description, specifications, reviews, \
     additional_images, crawl_status, crawl_error, source_query, created_at, updated_at";

/// A row from the `catalog_entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogEntryRow {
    pub id: Uuid,
    pub source_id: String,
    pub name: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub rating: f64,
    pub rating_count: i64,
    pub vendor_name: String,
    pub vendor_city: Option<String>,
    pub link: String,
    pub detail_url: String,
    pub description: String,
    pub specifications: Json<BTreeMap<String, String>>,
    pub reviews: Json<Vec<String>>,
    pub additional_images: Json<Vec<String>>,
    /// One of `ok`, `partial`, `failed` (enforced by a CHECK constraint).
    pub crawl_status: String,
    pub crawl_error: Option<String>,
    pub source_query: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CatalogEntryRow> for CatalogEntry {
    type Error = CatalogError;

    fn try_from(row: CatalogEntryRow) -> Result<Self, Self::Error> {
        let crawl_status: CrawlStatus =
            row.crawl_status
                .parse()
                .map_err(|reason| CatalogError::Decode {
                    field: "crawl_status",
                    reason,
                })?;
        let price = u64::try_from(row.price).map_err(|e| CatalogError::Decode {
            field: "price",
            reason: e.to_string(),
        })?;
        let rating_count = u64::try_from(row.rating_count).map_err(|e| CatalogError::Decode {
            field: "rating_count",
            reason: e.to_string(),
        })?;

        Ok(CatalogEntry {
            internal_id: row.id,
            record: EnrichedRecord {
                source_id: row.source_id,
                name: row.name,
                price,
                image_url: row.image_url,
                rating: row.rating,
                rating_count,
                vendor_name: row.vendor_name,
                vendor_city: row.vendor_city,
                link: row.link,
                detail_url: row.detail_url,
                description: row.description,
                specifications: row.specifications.0,
                reviews: row.reviews.0,
                additional_images: row.additional_images.0,
                crawl_status,
                crawl_error: row.crawl_error,
                source_query: row.source_query,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// [`CatalogStore`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_entries(rows: Vec<CatalogEntryRow>) -> Result<Vec<CatalogEntry>, CatalogError> {
    rows.into_iter().map(CatalogEntry::try_from).collect()
}

/// Escapes `LIKE` metacharacters so `text` matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn encode_u64(field: &'static str, value: u64) -> Result<i64, CatalogError> {
    i64::try_from(value).map_err(|e| CatalogError::Encode {
        field,
        reason: e.to_string(),
    })
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn save(
        &self,
        record: &EnrichedRecord,
        source_query: &str,
    ) -> Result<Uuid, CatalogError> {
        let price = encode_u64("price", record.price)?;
        let rating_count = encode_u64("rating_count", record.rating_count)?;

        // `id` is only used on insert; conflicting rows keep their original id.
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO catalog_entries \
                 (id, source_id, name, price, image_url, rating, rating_count, \
                  vendor_name, vendor_city, link, detail_url, description, \
                  specifications, reviews, additional_images, crawl_status, crawl_error, \
                  source_query) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
                     $13, $14, $15, $16, $17, $18) \
             ON CONFLICT (source_id) WHERE source_id <> '' DO UPDATE SET \
                 name              = EXCLUDED.name, \
                 price             = EXCLUDED.price, \
                 image_url         = EXCLUDED.image_url, \
                 rating            = EXCLUDED.rating, \
                 rating_count      = EXCLUDED.rating_count, \
                 vendor_name       = EXCLUDED.vendor_name, \
                 vendor_city       = EXCLUDED.vendor_city, \
                 link              = EXCLUDED.link, \
                 detail_url        = EXCLUDED.detail_url, \
                 description       = EXCLUDED.description, \
                 specifications    = EXCLUDED.specifications, \
                 reviews           = EXCLUDED.reviews, \
                 additional_images = EXCLUDED.additional_images, \
                 crawl_status      = EXCLUDED.crawl_status, \
                 crawl_error       = EXCLUDED.crawl_error, \
                 source_query      = EXCLUDED.source_query, \
                 updated_at        = NOW() \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&record.source_id)
        .bind(&record.name)
        .bind(price)
        .bind(&record.image_url)
        .bind(record.rating)
        .bind(rating_count)
        .bind(&record.vendor_name)
        .bind(&record.vendor_city)
        .bind(&record.link)
        .bind(&record.detail_url)
        .bind(&record.description)
        .bind(Json(&record.specifications))
        .bind(Json(&record.reviews))
        .bind(Json(&record.additional_images))
        .bind(record.crawl_status.as_str())
        .bind(&record.crawl_error)
        .bind(source_query)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, internal_id: Uuid) -> Result<Option<CatalogEntry>, CatalogError> {
        let row = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_entries WHERE id = $1"
        ))
        .bind(internal_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CatalogEntry::try_from).transpose()
    }

    async fn list_by_search_tag(
        &self,
        source_query: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let rows = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_entries \
             WHERE source_query = $1 \
             ORDER BY created_at DESC, id"
        ))
        .bind(source_query)
        .fetch_all(&self.pool)
        .await?;

        to_entries(rows)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CatalogEntry>, CatalogError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_entries \
             ORDER BY created_at DESC, id \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        to_entries(rows)
    }

    async fn search_text(&self, text: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let pattern = format!("%{}%", escape_like(text.trim()));
        let rows = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_entries \
             WHERE name ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\' \
             ORDER BY created_at DESC, id"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        to_entries(rows)
    }

    async fn delete(&self, internal_id: Uuid) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM catalog_entries WHERE id = $1")
            .bind(internal_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("کیف"), "کیف");
    }

    #[test]
    fn encode_u64_rejects_overflow() {
        assert_eq!(encode_u64("price", 42).unwrap(), 42);
        let err = encode_u64("price", u64::MAX).unwrap_err();
        assert!(matches!(err, CatalogError::Encode { field: "price", .. }));
    }

    #[test]
    fn row_with_unknown_status_fails_to_decode() {
        let row = CatalogEntryRow {
            id: Uuid::new_v4(),
            source_id: "1".to_string(),
            name: "Bag".to_string(),
            price: 100,
            image_url: None,
            rating: 0.0,
            rating_count: 0,
            vendor_name: String::new(),
            vendor_city: None,
            link: String::new(),
            detail_url: String::new(),
            description: String::new(),
            specifications: Json(BTreeMap::new()),
            reviews: Json(Vec::new()),
            additional_images: Json(Vec::new()),
            crawl_status: "exploded".to_string(),
            crawl_error: None,
            source_query: "bag".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let err = CatalogEntry::try_from(row).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Decode {
                field: "crawl_status",
                ..
            }
        ));
    }
}
