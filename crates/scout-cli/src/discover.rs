//! `discover` command handler.

use scout_core::SearchFilters;
use scout_discovery::DiscoveryService;

use crate::display;

/// Runs one discovery pipeline and prints its report.
///
/// # Errors
///
/// Returns an error only when the original-query search fails; every
/// per-candidate failure is part of the printed report.
pub(crate) async fn run_discover(
    service: &DiscoveryService,
    query: &str,
    filters: &SearchFilters,
    json: bool,
) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("query must not be empty");
    }

    let report = service.run_discovery_pipeline(query, filters).await?;

    if json {
        let body = serde_json::json!({
            "query": query,
            "components": report.aggregation.components,
            "strategy": report.aggregation.strategy,
            "candidates": report.candidates(),
            "mapping": report.mapping,
            "outcomes": report
                .outcomes
                .iter()
                .map(|o| serde_json::json!({
                    "source_id": o.source_id,
                    "state": o.outcome.as_str(),
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", display::format_report(&report));
    }

    Ok(())
}
