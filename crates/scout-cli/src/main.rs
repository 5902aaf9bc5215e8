mod catalog;
mod discover;
mod display;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use scout_core::{AppConfig, SearchFilters};
use scout_db::catalog::DEFAULT_RECENT_LIMIT;
use scout_db::{CachedCatalog, CatalogStore, PgCatalogStore};
use scout_discovery::{
    ChatExpander, DiscoveryPipeline, DiscoveryService, NoExpansion, PipelineConfig, QueryExpander,
};
use scout_scraper::{DetailEnricher, SearchClient};

#[derive(Debug, Parser)]
#[command(name = "scout")]
#[command(about = "Marketplace product discovery and catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Search, enrich and store the cheapest matches for a query
    Discover {
        /// What to look for, e.g. "leather bag"
        query: String,
        /// Upper price bound in the marketplace currency subunit
        #[arg(long)]
        max_price: Option<u64>,
        /// Minimum average rating (0-5)
        #[arg(long)]
        min_rating: Option<f64>,
        /// Only vendors in this city (case-insensitive)
        #[arg(long)]
        vendor_city: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one stored entry in detail
    Show {
        internal_id: Uuid,
        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare two or three stored entries side by side
    Compare {
        #[arg(required = true, num_args = 2..=3)]
        internal_ids: Vec<Uuid>,
    },
    /// List the most recently stored entries
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Find stored entries whose name or description contains TEXT
    Search { text: String },
    /// List entries stored by runs of exactly QUERY
    Tagged { query: String },
    /// Delete a stored entry
    Delete { internal_id: Uuid },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = scout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = scout_db::PoolConfig::from_app_config(&config);
    let pool = scout_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Db { command } => match command {
            DbCommands::Migrate => {
                let applied = scout_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
            DbCommands::Ping => {
                scout_db::health_check(&pool).await?;
                println!("database reachable");
            }
        },
        Commands::Discover {
            query,
            max_price,
            min_rating,
            vendor_city,
            json,
        } => {
            let filters = SearchFilters {
                max_price,
                min_rating,
                vendor_city,
            };
            let service = build_service(&config, pool)?;
            discover::run_discover(&service, &query, &filters, json).await?;
        }
        Commands::Show { internal_id, json } => {
            catalog::run_show(&build_service(&config, pool)?, internal_id, json).await?;
        }
        Commands::Compare { internal_ids } => {
            catalog::run_compare(&build_service(&config, pool)?, &internal_ids).await?;
        }
        Commands::Recent { limit } => {
            catalog::run_recent(&build_service(&config, pool)?, limit).await?;
        }
        Commands::Search { text } => {
            catalog::run_search(&build_service(&config, pool)?, &text).await?;
        }
        Commands::Tagged { query } => {
            catalog::run_tagged(&build_service(&config, pool)?, &query).await?;
        }
        Commands::Delete { internal_id } => {
            catalog::run_delete(&build_service(&config, pool)?, internal_id).await?;
        }
    }

    Ok(())
}

/// Wires the production collaborators into a [`DiscoveryService`].
///
/// The LLM expander is used only when an API key is configured; otherwise
/// discovery searches the original query alone.
fn build_service(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<DiscoveryService> {
    let timeout = config.per_call_timeout();

    let search = SearchClient::new(
        &config.search_api_url,
        &config.marketplace_base_url,
        timeout,
        &config.user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;
    let enricher = DetailEnricher::new(timeout, &config.user_agent, &config.asset_host)
        .map_err(|e| anyhow::anyhow!("failed to build detail enricher: {e}"))?;

    let expander: Arc<dyn QueryExpander> = match &config.llm {
        Some(llm) => Arc::new(
            ChatExpander::new(llm, timeout)
                .map_err(|e| anyhow::anyhow!("failed to build query expander: {e}"))?,
        ),
        None => {
            tracing::info!("no LLM API key configured, query expansion disabled");
            Arc::new(NoExpansion)
        }
    };

    let store: Arc<dyn CatalogStore> = Arc::new(CachedCatalog::new(PgCatalogStore::new(pool)));
    let pipeline = DiscoveryPipeline::new(
        Arc::new(search),
        expander,
        Arc::new(enricher),
        Arc::clone(&store),
        PipelineConfig::from_app_config(config),
    );

    Ok(DiscoveryService::new(pipeline, store))
}
