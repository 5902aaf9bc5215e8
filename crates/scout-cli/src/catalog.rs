//! Catalog read and delete command handlers.
//!
//! These are called from `main` after the service is wired. A missing entry
//! or an unresolvable comparison surfaces as an error so the process exits
//! non-zero.

use scout_discovery::DiscoveryService;
use uuid::Uuid;

use crate::display;

pub(crate) async fn run_show(
    service: &DiscoveryService,
    internal_id: Uuid,
    json: bool,
) -> anyhow::Result<()> {
    let entry = service.get_entry(internal_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("{}", display::format_entry(&entry));
    }
    Ok(())
}

pub(crate) async fn run_compare(
    service: &DiscoveryService,
    internal_ids: &[Uuid],
) -> anyhow::Result<()> {
    let comparison = service.compare_entries(internal_ids).await?;
    println!("{}", display::format_comparison(&comparison));
    Ok(())
}

pub(crate) async fn run_recent(service: &DiscoveryService, limit: usize) -> anyhow::Result<()> {
    let entries = service.list_recent(limit).await?;
    println!("{}", display::format_entry_list(&entries));
    Ok(())
}

pub(crate) async fn run_search(service: &DiscoveryService, text: &str) -> anyhow::Result<()> {
    let entries = service.search_stored(text).await?;
    if entries.is_empty() {
        println!("no stored entries match \"{text}\"");
        return Ok(());
    }
    println!("{}", display::format_entry_list(&entries));
    Ok(())
}

pub(crate) async fn run_tagged(service: &DiscoveryService, query: &str) -> anyhow::Result<()> {
    let entries = service.entries_for_query(query).await?;
    if entries.is_empty() {
        println!("no entries stored for query \"{query}\"; run `discover` first");
        return Ok(());
    }
    println!("{}", display::format_entry_list(&entries));
    Ok(())
}

pub(crate) async fn run_delete(service: &DiscoveryService, internal_id: Uuid) -> anyhow::Result<()> {
    service.delete_entry(internal_id).await?;
    println!("deleted {internal_id}");
    Ok(())
}
