//! Plain-text rendering for CLI output.
//!
//! Every function returns a `String` so the layouts can be tested without
//! capturing stdout.

use chrono::{DateTime, Utc};
use scout_core::{CatalogEntry, ComparisonResult, ListingRecord};
use scout_discovery::{CandidateOutcome, PipelineReport};

/// Review texts are cut to this many characters in the detail view.
const REVIEW_DISPLAY_CHARS: usize = 100;
/// How many reviews the detail view shows.
const REVIEWS_SHOWN: usize = 3;
const NAME_COLUMN_CHARS: usize = 50;

/// Cuts `text` to `max` characters, appending `...` when anything was cut.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Formats a price with `,` thousands separators.
pub(crate) fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn fmt_rating(rating: Option<f64>) -> String {
    rating.map_or_else(|| "\u{2014}".to_string(), |r| format!("{r:.1}"))
}

fn fmt_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn format_candidates(candidates: &[ListingRecord]) -> String {
    if candidates.is_empty() {
        return "no candidates found".to_string();
    }
    let mut lines = vec![format!(
        "{:<4}{:>14}  {:<8}{:<20}NAME",
        "#", "PRICE", "RATING", "VENDOR"
    )];
    for (i, c) in candidates.iter().enumerate() {
        lines.push(format!(
            "{:<4}{:>14}  {:<8}{:<20}{}",
            i + 1,
            format_price(c.price),
            fmt_rating(c.rating),
            truncate_chars(&c.vendor_name, 18),
            truncate_chars(&c.name, NAME_COLUMN_CHARS),
        ));
    }
    lines.join("\n")
}

pub(crate) fn format_report(report: &PipelineReport) -> String {
    let aggregation = &report.aggregation;
    let mut lines = Vec::new();

    if aggregation.components.is_empty() {
        lines.push("expansion: none".to_string());
    } else {
        lines.push(format!("expansion: {}", aggregation.components.join(", ")));
        lines.push(format!("strategy: {}", aggregation.strategy));
    }
    for failure in &aggregation.failures {
        lines.push(format!(
            "warning: component \"{}\" failed: {}",
            failure.component, failure.error
        ));
    }
    lines.push(String::new());
    lines.push(format_candidates(report.candidates()));
    lines.push(String::new());

    for outcome in &report.outcomes {
        let detail = match &outcome.outcome {
            CandidateOutcome::Saved { internal_id } => internal_id.to_string(),
            CandidateOutcome::Skipped { reason } => reason.clone(),
            CandidateOutcome::EnrichmentFailed { error } | CandidateOutcome::SaveFailed { error } => {
                error.clone()
            }
        };
        lines.push(format!(
            "{:<18}{:<14}{}",
            outcome.outcome.as_str(),
            truncate_chars(&outcome.source_id, 12),
            detail
        ));
    }
    lines.push(format!(
        "saved {} of {} enriched candidates ({} found)",
        report.saved_count(),
        report.outcomes.len(),
        report.candidates().len()
    ));

    lines.join("\n")
}

/// Detailed single-entry view.
pub(crate) fn format_entry(entry: &CatalogEntry) -> String {
    let r = &entry.record;
    let mut lines = vec![
        r.name.clone(),
        format!("id:          {}", entry.internal_id),
        format!("price:       {}", format_price(r.price)),
        format!("rating:      {:.1} ({} ratings)", r.rating, r.rating_count),
        format!(
            "vendor:      {}{}",
            r.vendor_name,
            r.vendor_city
                .as_deref()
                .map(|c| format!(" ({c})"))
                .unwrap_or_default()
        ),
        format!("link:        {}", r.link),
        format!("status:      {}", r.crawl_status),
        format!("query:       {}", r.source_query),
        format!(
            "stored:      {} (updated {})",
            fmt_timestamp(entry.created_at),
            fmt_timestamp(entry.updated_at)
        ),
    ];

    if !r.description.is_empty() {
        lines.push(String::new());
        lines.push(r.description.clone());
    }

    if !r.specifications.is_empty() {
        lines.push(String::new());
        lines.push("specifications:".to_string());
        for (key, value) in &r.specifications {
            lines.push(format!("  {key}: {value}"));
        }
    }

    if !r.reviews.is_empty() {
        lines.push(String::new());
        lines.push(format!("reviews ({}):", r.reviews.len()));
        for review in r.reviews.iter().take(REVIEWS_SHOWN) {
            lines.push(format!("  - {}", truncate_chars(review, REVIEW_DISPLAY_CHARS)));
        }
    }

    if !r.additional_images.is_empty() {
        lines.push(String::new());
        lines.push(format!("images: {}", r.additional_images.len()));
    }

    lines.join("\n")
}

pub(crate) fn format_entry_list(entries: &[CatalogEntry]) -> String {
    if entries.is_empty() {
        return "no stored entries".to_string();
    }
    let mut lines = vec![format!(
        "{:<38}{:>14}  {:<8}{:<18}NAME",
        "ID", "PRICE", "RATING", "STORED"
    )];
    for entry in entries {
        lines.push(format!(
            "{:<38}{:>14}  {:<8.1}{:<18}{}",
            entry.internal_id,
            format_price(entry.record.price),
            entry.record.rating,
            fmt_timestamp(entry.created_at),
            truncate_chars(&entry.record.name, NAME_COLUMN_CHARS),
        ));
    }
    lines.join("\n")
}

/// Side-by-side comparison table followed by the price summary.
pub(crate) fn format_comparison(comparison: &ComparisonResult) -> String {
    const LABEL: usize = 10;
    const COLUMN: usize = 28;

    let row = |label: &str, cells: Vec<String>| {
        let mut line = format!("{label:<LABEL$}");
        for cell in cells {
            line.push_str(&format!("{:<COLUMN$}", truncate_chars(&cell, COLUMN - 4)));
        }
        line.trim_end().to_string()
    };

    let entries = &comparison.entries;
    let mut lines = vec![
        row(
            "",
            (1..=entries.len()).map(|i| format!("#{i}")).collect(),
        ),
        row(
            "name",
            entries.iter().map(|e| e.record.name.clone()).collect(),
        ),
        row(
            "price",
            entries.iter().map(|e| format_price(e.record.price)).collect(),
        ),
        row(
            "rating",
            comparison.ratings().iter().map(|r| format!("{r:.1}")).collect(),
        ),
        row(
            "vendor",
            comparison.vendors().iter().map(ToString::to_string).collect(),
        ),
        row(
            "city",
            comparison
                .cities()
                .iter()
                .map(|c| c.unwrap_or("\u{2014}").to_string())
                .collect(),
        ),
    ];

    let summary = &comparison.summary;
    lines.push(String::new());
    lines.push(format!(
        "cheapest {} / most expensive {} / spread {}",
        format_price(summary.min_price),
        format_price(summary.max_price),
        format_price(summary.spread)
    ));
    lines.join("\n")
}

#[cfg(test)]
#[path = "display_test.rs"]
mod tests;
