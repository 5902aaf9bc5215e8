//! Postgres connectivity, migrations, and the product catalog.

pub mod catalog;

pub use catalog::{CachedCatalog, CatalogStore, MemoryCatalogStore, PgCatalogStore};

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Relative to crates/scout-db/Cargo.toml.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &scout_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

/// Failures raised by the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot store {field}: {reason}")]
    Encode { field: &'static str, reason: String },
    #[error("stored {field} is invalid: {reason}")]
    Decode { field: &'static str, reason: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Opens the catalog pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] when no connection can be established within
/// the acquire timeout.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Applies pending catalog migrations and returns how many ran.
///
/// # Errors
///
/// Returns [`CatalogError::Migration`] when a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, CatalogError> {
    // A fresh database has no _sqlx_migrations table yet; count that as zero.
    let applied_before = applied_migration_count(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migration_count(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn applied_migration_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Round-trips `SELECT 1` through the pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] when the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// [`ping`] with the failure mapped into [`CatalogError`].
///
/// # Errors
///
/// Returns [`CatalogError::Sqlx`] when the database is unreachable.
pub async fn health_check(pool: &PgPool) -> Result<(), CatalogError> {
    ping(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_config_matches_documented_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn encode_error_names_the_field() {
        let err = CatalogError::Encode {
            field: "price",
            reason: "out of range".to_string(),
        };
        assert_eq!(err.to_string(), "cannot store price: out of range");
    }
}
