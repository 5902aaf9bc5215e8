use std::time::Duration;

use super::*;

const ENDPOINT: &str = "https://search.basalam.com/ai-engine/api/v2.0/product/search";

fn client() -> SearchClient {
    SearchClient::new(
        ENDPOINT,
        "https://basalam.com/",
        Duration::from_secs(5),
        "scout-test/0.1",
    )
    .expect("failed to build test SearchClient")
}

#[test]
fn search_url_with_query_only() {
    let url = client().search_url("bag", &SearchFilters::default()).unwrap();
    assert_eq!(url, format!("{ENDPOINT}?q=bag"));
}

#[test]
fn search_url_encodes_non_ascii_query() {
    let url = client()
        .search_url("کیف چرمی", &SearchFilters::default())
        .unwrap();
    let parsed = reqwest::Url::parse(&url).unwrap();
    let q: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    assert_eq!(q, vec![("q".to_string(), "کیف چرمی".to_string())]);
}

#[test]
fn search_url_includes_only_set_filters() {
    let filters = SearchFilters {
        max_price: Some(300_000),
        min_rating: None,
        vendor_city: Some("  Tabriz ".to_string()),
    };
    let url = client().search_url("bag", &filters).unwrap();
    assert_eq!(
        url,
        format!("{ENDPOINT}?q=bag&max_price=300000&vendor_city=Tabriz")
    );
}

#[test]
fn search_url_skips_blank_city() {
    let filters = SearchFilters {
        max_price: None,
        min_rating: Some(4.5),
        vendor_city: Some("   ".to_string()),
    };
    let url = client().search_url("bag", &filters).unwrap();
    assert_eq!(url, format!("{ENDPOINT}?q=bag&min_rating=4.5"));
}

#[test]
fn new_rejects_relative_endpoint() {
    let result = SearchClient::new("/search", "https://basalam.com", Duration::from_secs(5), "ua");
    assert!(
        matches!(result, Err(ScraperError::InvalidUrl { .. })),
        "expected InvalidUrl, got: {result:?}"
    );
}

#[test]
fn extract_origin_strips_path() {
    assert_eq!(
        extract_origin("https://basalam.com/p/16078271"),
        "https://basalam.com"
    );
}

#[test]
fn extract_origin_falls_back_on_garbage() {
    assert_eq!(extract_origin("garbage"), "garbage");
}

#[test]
fn extract_domain_strips_scheme() {
    assert_eq!(extract_domain("https://basalam.com/p/1"), "basalam.com");
    assert_eq!(extract_domain("garbage"), "garbage");
}

#[test]
fn resolve_short_link_with_vendor() {
    assert_eq!(
        resolve_detail_url("https://basalam.com/p/16078271", "tabriz-leather").as_deref(),
        Some("https://basalam.com/tabriz-leather/product/16078271")
    );
}

#[test]
fn resolve_short_link_with_trailing_slash() {
    assert_eq!(
        resolve_detail_url("https://basalam.com/p/16078271/", " shop ").as_deref(),
        Some("https://basalam.com/shop/product/16078271")
    );
}

#[test]
fn resolve_short_link_without_vendor_is_unresolvable() {
    assert!(resolve_detail_url("https://basalam.com/p/16078271", "").is_none());
    assert!(resolve_detail_url("https://basalam.com/p/16078271", "   ").is_none());
}

#[test]
fn resolve_full_link_passes_through() {
    let link = "https://basalam.com/tabriz-leather/product/16078271";
    assert_eq!(resolve_detail_url(link, "").as_deref(), Some(link));
}

#[test]
fn resolve_empty_or_relative_link_is_unresolvable() {
    assert!(resolve_detail_url("", "vendor").is_none());
    assert!(resolve_detail_url("/p/1", "vendor").is_none());
    assert!(resolve_detail_url("ftp://basalam.com/p/1", "vendor").is_none());
}
