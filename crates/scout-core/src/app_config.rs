use std::time::Duration;

/// Connection settings for the OpenAI-compatible endpoint used to expand
/// queries into related search terms.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[redacted]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub search_api_url: String,
    pub marketplace_base_url: String,
    pub asset_host: String,
    pub user_agent: String,
    pub per_call_timeout_secs: u64,
    pub max_candidates_to_enrich: usize,
    pub max_expansion_components: usize,
    pub enrichment_concurrency: usize,
    /// `None` disables query expansion; searches use the original query only.
    pub llm: Option<LlmConfig>,
}

impl AppConfig {
    #[must_use]
    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_secs(self.per_call_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("search_api_url", &self.search_api_url)
            .field("marketplace_base_url", &self.marketplace_base_url)
            .field("asset_host", &self.asset_host)
            .field("user_agent", &self.user_agent)
            .field("per_call_timeout_secs", &self.per_call_timeout_secs)
            .field("max_candidates_to_enrich", &self.max_candidates_to_enrich)
            .field("max_expansion_components", &self.max_expansion_components)
            .field("enrichment_concurrency", &self.enrichment_concurrency)
            .field("llm", &self.llm)
            .finish()
    }
}
