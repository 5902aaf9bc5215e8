use crate::app_config::{AppConfig, LlmConfig};
use crate::ConfigError;

pub const DEFAULT_SEARCH_API_URL: &str =
    "https://search.basalam.com/ai-engine/api/v2.0/product/search";
pub const DEFAULT_MARKETPLACE_BASE_URL: &str = "https://basalam.com";
pub const DEFAULT_ASSET_HOST: &str = "basalam.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_LLM_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(0) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            Ok(value) => Ok(value),
            Err(e) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let log_level = or_default("SCOUT_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SCOUT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SCOUT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SCOUT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let search_api_url = or_default("SCOUT_SEARCH_API_URL", DEFAULT_SEARCH_API_URL);
    let marketplace_base_url =
        or_default("SCOUT_MARKETPLACE_BASE_URL", DEFAULT_MARKETPLACE_BASE_URL);
    let asset_host = or_default("SCOUT_ASSET_HOST", DEFAULT_ASSET_HOST);
    let user_agent = or_default("SCOUT_USER_AGENT", DEFAULT_USER_AGENT);

    let per_call_timeout_secs = parse_u64("SCOUT_PER_CALL_TIMEOUT_SECS", "15")?;
    if per_call_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SCOUT_PER_CALL_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let max_candidates_to_enrich = parse_positive_usize("SCOUT_MAX_CANDIDATES_TO_ENRICH", "5")?;
    let max_expansion_components = parse_positive_usize("SCOUT_MAX_EXPANSION_COMPONENTS", "5")?;
    let enrichment_concurrency = parse_positive_usize("SCOUT_ENRICHMENT_CONCURRENCY", "5")?;

    let llm = lookup("SCOUT_LLM_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(|api_key| LlmConfig {
            api_key,
            api_base: or_default("SCOUT_LLM_API_BASE", DEFAULT_LLM_API_BASE),
            model: or_default("SCOUT_LLM_MODEL", DEFAULT_LLM_MODEL),
        });

    Ok(AppConfig {
        database_url,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        search_api_url,
        marketplace_base_url,
        asset_host,
        user_agent,
        per_call_timeout_secs,
        max_candidates_to_enrich,
        max_expansion_components,
        enrichment_concurrency,
        llm,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
