//! End-to-end pipeline tests.
//!
//! Search and expansion are stubbed, detail pages are served by a wiremock
//! server through the real `DetailEnricher`, and saves land in the
//! in-memory catalog.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scout_core::{CrawlStatus, EnrichedRecord, ListingRecord, SearchFilters};
use scout_db::{CatalogStore, MemoryCatalogStore};
use scout_discovery::{
    CandidateOutcome, DiscoveryError, DiscoveryPipeline, Expansion, ExpanderError,
    NoExpansion, PipelineConfig, QueryExpander,
};
use scout_scraper::{DetailEnricher, Enricher, ListingSearch, ScraperError};

const VENDOR: &str = "shop";

struct StubSearch {
    results: HashMap<String, Vec<ListingRecord>>,
}

#[async_trait]
impl ListingSearch for StubSearch {
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ListingRecord>, ScraperError> {
        match self.results.get(query) {
            Some(records) => Ok(records
                .iter()
                .filter(|r| filters.accepts(r))
                .cloned()
                .collect()),
            None => Err(ScraperError::UnexpectedStatus {
                status: 503,
                url: format!("stub://{query}"),
            }),
        }
    }
}

struct FixedExpander(Vec<&'static str>);

#[async_trait]
impl QueryExpander for FixedExpander {
    async fn expand(&self, _query: &str) -> Result<Expansion, ExpanderError> {
        Ok(Expansion {
            components: self.0.iter().map(ToString::to_string).collect(),
            strategy: "fixed".to_string(),
        })
    }
}

fn listing(server: &MockServer, source_id: &str, price: u64) -> ListingRecord {
    ListingRecord {
        source_id: source_id.to_string(),
        name: format!("listing {source_id}"),
        price,
        image_url: None,
        rating: Some(4.2),
        rating_count: Some(12),
        vendor_name: VENDOR.to_string(),
        vendor_city: Some("Tabriz".to_string()),
        link: format!("{}/p/{source_id}", server.uri()),
    }
}

fn detail_page(name: &str, price: &str) -> String {
    format!(
        r#"<html><body>
  <h1 class="thh9OB">{name}</h1>
  <span class="PlpxQp">{price} تومان</span>
  <p class="bs-read-more__text">Hand made.</p>
  <div class="review-item">Arrived quickly and well packed.</div>
</body></html>"#
    )
}

async fn mount_detail(server: &MockServer, source_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/{VENDOR}/product/{source_id}")))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, source_id: &str, name: &str, price: &str) {
    let page = detail_page(name, price);
    mount_detail(server, source_id, ResponseTemplate::new(200).set_body_string(page)).await;
}

fn search_with(query: &str, records: Vec<ListingRecord>) -> Arc<StubSearch> {
    Arc::new(StubSearch {
        results: HashMap::from([(query.to_string(), records)]),
    })
}

fn enricher() -> Arc<DetailEnricher> {
    Arc::new(
        DetailEnricher::new(Duration::from_secs(10), "scout-test/0.1", "basalam.com")
            .expect("failed to build test DetailEnricher"),
    )
}

fn pipeline(
    search: Arc<StubSearch>,
    expander: Arc<dyn QueryExpander>,
    store: Arc<MemoryCatalogStore>,
    config: PipelineConfig,
) -> DiscoveryPipeline {
    DiscoveryPipeline::new(search, expander, enricher(), store, config)
}

#[tokio::test]
async fn failed_detail_fetch_is_excluded_and_others_succeed() {
    let server = MockServer::start().await;
    mount_page(&server, "a", "Bag A", "120,000").await;
    mount_detail(&server, "b", ResponseTemplate::new(404)).await;
    mount_page(&server, "c", "Bag C", "310,000").await;

    let search = search_with(
        "leather bag",
        vec![
            listing(&server, "c", 300_000),
            listing(&server, "a", 100_000),
            listing(&server, "b", 200_000),
        ],
    );
    let store = Arc::new(MemoryCatalogStore::new());
    let report = pipeline(
        search,
        Arc::new(NoExpansion),
        store.clone(),
        PipelineConfig::default(),
    )
    .run("leather bag", &SearchFilters::default())
    .await
    .expect("pipeline run");

    let ids: Vec<&str> = report
        .candidates()
        .iter()
        .map(|c| c.source_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    assert_eq!(report.mapping.len(), 2);
    assert!(report.mapping.contains_key("a"));
    assert!(report.mapping.contains_key("c"));
    assert!(!report.mapping.contains_key("b"));
    assert_eq!(report.saved_count(), 2);

    let failed = report
        .outcomes
        .iter()
        .find(|o| o.source_id == "b")
        .expect("outcome for b");
    assert!(
        matches!(failed.outcome, CandidateOutcome::EnrichmentFailed { ref error } if error.contains("not found")),
        "unexpected outcome: {:?}",
        failed.outcome
    );
    assert_eq!(store.len(), 2);

    let saved = store
        .get(report.mapping["a"])
        .await
        .expect("get")
        .expect("entry a");
    assert_eq!(saved.record.name, "Bag A");
    assert_eq!(saved.record.price, 120_000, "extracted price wins over listing");
    assert_eq!(saved.record.source_query, "leather bag");
    assert_eq!(saved.record.vendor_city.as_deref(), Some("Tabriz"));
    assert_eq!(saved.record.rating_count, 12);
    assert_eq!(saved.record.crawl_status, CrawlStatus::Ok);
    assert_eq!(saved.record.reviews.len(), 1);
}

#[tokio::test]
async fn only_top_candidates_are_enriched() {
    let server = MockServer::start().await;
    let mut records = Vec::new();
    for i in 0..7u64 {
        let id = format!("p{i}");
        mount_page(&server, &id, &id, "1,000").await;
        records.push(listing(&server, &id, 1_000 * (i + 1)));
    }

    let store = Arc::new(MemoryCatalogStore::new());
    let config = PipelineConfig {
        max_candidates_to_enrich: 5,
        enrichment_concurrency: 2,
        ..PipelineConfig::default()
    };
    let report = pipeline(
        search_with("q", records),
        Arc::new(NoExpansion),
        store.clone(),
        config,
    )
    .run("q", &SearchFilters::default())
    .await
    .expect("pipeline run");

    assert_eq!(report.candidates().len(), 7);
    assert_eq!(report.outcomes.len(), 5);
    let enriched: Vec<&str> = report
        .outcomes
        .iter()
        .map(|o| o.source_id.as_str())
        .collect();
    assert_eq!(enriched, vec!["p0", "p1", "p2", "p3", "p4"]);
    assert_eq!(store.len(), 5);
}

/// Records how many `enrich` calls overlap at once.
#[derive(Default)]
struct OverlapEnricher {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl Enricher for OverlapEnricher {
    async fn enrich(&self, detail_url: &str) -> EnrichedRecord {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut record = EnrichedRecord::empty(detail_url, CrawlStatus::Ok);
        record.name = "enriched".to_string();
        record
    }
}

#[tokio::test]
async fn enrichment_fan_out_never_exceeds_the_concurrency_limit() {
    let server = MockServer::start().await;
    let records: Vec<ListingRecord> = (0..8u64)
        .map(|i| listing(&server, &format!("p{i}"), 1_000 * (i + 1)))
        .collect();

    let enricher = Arc::new(OverlapEnricher::default());
    let store = Arc::new(MemoryCatalogStore::new());
    let config = PipelineConfig {
        max_candidates_to_enrich: 8,
        enrichment_concurrency: 3,
        ..PipelineConfig::default()
    };
    let report = DiscoveryPipeline::new(
        search_with("q", records),
        Arc::new(NoExpansion),
        enricher.clone(),
        store.clone(),
        config,
    )
    .run("q", &SearchFilters::default())
    .await
    .expect("pipeline run");

    assert_eq!(enricher.calls.load(Ordering::SeqCst), 8);
    assert_eq!(enricher.peak.load(Ordering::SeqCst), 3);
    assert_eq!(report.saved_count(), 8);
    assert_eq!(store.len(), 8);
}

#[tokio::test]
async fn candidates_without_vendor_or_link_are_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "ok", "Kept", "5,000").await;

    let mut no_vendor = listing(&server, "nv", 1_000);
    no_vendor.vendor_name = String::new();
    let mut no_link = listing(&server, "nl", 2_000);
    no_link.link = String::new();

    let store = Arc::new(MemoryCatalogStore::new());
    let report = pipeline(
        search_with("q", vec![no_vendor, no_link, listing(&server, "ok", 3_000)]),
        Arc::new(NoExpansion),
        store.clone(),
        PipelineConfig::default(),
    )
    .run("q", &SearchFilters::default())
    .await
    .expect("pipeline run");

    let states: Vec<&str> = report.outcomes.iter().map(|o| o.outcome.as_str()).collect();
    assert_eq!(states, vec!["skipped", "skipped", "saved"]);
    assert_eq!(report.mapping.keys().collect::<Vec<_>>(), vec!["ok"]);
}

#[tokio::test]
async fn slow_detail_page_counts_as_failed() {
    let server = MockServer::start().await;
    mount_detail(
        &server,
        "slow",
        ResponseTemplate::new(200)
            .set_body_string(detail_page("Slow", "9,000"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    mount_page(&server, "fast", "Fast", "8,000").await;

    let store = Arc::new(MemoryCatalogStore::new());
    let config = PipelineConfig {
        per_call_timeout: Duration::from_secs(1),
        ..PipelineConfig::default()
    };
    let report = pipeline(
        search_with(
            "q",
            vec![listing(&server, "fast", 8_000), listing(&server, "slow", 9_000)],
        ),
        Arc::new(NoExpansion),
        store,
        config,
    )
    .run("q", &SearchFilters::default())
    .await
    .expect("pipeline run");

    assert_eq!(report.mapping.len(), 1);
    assert!(report.mapping.contains_key("fast"));
    let slow = &report.outcomes[1];
    assert!(
        matches!(slow.outcome, CandidateOutcome::EnrichmentFailed { ref error } if error.contains("timed out")),
        "unexpected outcome: {:?}",
        slow.outcome
    );
}

#[tokio::test]
async fn every_enrichment_failing_still_returns_candidates() {
    let server = MockServer::start().await;
    mount_detail(&server, "x", ResponseTemplate::new(500)).await;
    mount_detail(&server, "y", ResponseTemplate::new(500)).await;

    let store = Arc::new(MemoryCatalogStore::new());
    let report = pipeline(
        search_with("q", vec![listing(&server, "x", 10), listing(&server, "y", 20)]),
        Arc::new(NoExpansion),
        store.clone(),
        PipelineConfig::default(),
    )
    .run("q", &SearchFilters::default())
    .await
    .expect("pipeline run");

    assert_eq!(report.candidates().len(), 2);
    assert!(report.mapping.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn repeated_runs_reuse_internal_ids() {
    let server = MockServer::start().await;
    mount_page(&server, "a", "Bag A", "100").await;

    let store = Arc::new(MemoryCatalogStore::new());
    let run = pipeline(
        search_with("q", vec![listing(&server, "a", 100)]),
        Arc::new(NoExpansion),
        store.clone(),
        PipelineConfig::default(),
    );

    let first = run.run("q", &SearchFilters::default()).await.expect("first run");
    let second = run.run("q", &SearchFilters::default()).await.expect("second run");

    assert_eq!(first.mapping, second.mapping);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn expansion_components_feed_the_candidate_pool() {
    let server = MockServer::start().await;
    mount_page(&server, "kettle", "Kettle", "50").await;
    mount_page(&server, "dripper", "Dripper", "70").await;

    let search = Arc::new(StubSearch {
        results: HashMap::from([
            ("pour over".to_string(), vec![listing(&server, "dripper", 70)]),
            (
                "kettle".to_string(),
                vec![listing(&server, "kettle", 50), listing(&server, "dripper", 70)],
            ),
        ]),
    });

    let store = Arc::new(MemoryCatalogStore::new());
    let report = pipeline(
        search,
        Arc::new(FixedExpander(vec!["kettle", "missing component"])),
        store.clone(),
        PipelineConfig::default(),
    )
    .run("pour over", &SearchFilters::default())
    .await
    .expect("pipeline run");

    let ids: Vec<&str> = report
        .candidates()
        .iter()
        .map(|c| c.source_id.as_str())
        .collect();
    assert_eq!(ids, vec!["kettle", "dripper"]);
    assert_eq!(report.aggregation.failures.len(), 1);
    assert_eq!(report.aggregation.failures[0].component, "missing component");
    assert_eq!(report.mapping.len(), 2);

    let tagged = store.list_by_search_tag("pour over").await.expect("list");
    assert_eq!(tagged.len(), 2);
}

#[tokio::test]
async fn original_search_failure_fails_the_run() {
    let store = Arc::new(MemoryCatalogStore::new());
    let search = Arc::new(StubSearch {
        results: HashMap::new(),
    });

    let err = pipeline(search, Arc::new(NoExpansion), store, PipelineConfig::default())
        .run("anything", &SearchFilters::default())
        .await
        .expect_err("run should fail");

    assert!(matches!(err, DiscoveryError::Transport { .. }), "got: {err:?}");
}

#[tokio::test]
async fn max_price_filter_bounds_the_pool() {
    let server = MockServer::start().await;
    for id in ["cheap", "mid"] {
        mount_page(&server, id, id, "1").await;
    }

    let search = search_with(
        "bag under 300000",
        vec![
            listing(&server, "mid", 250_000),
            listing(&server, "pricey", 450_000),
            listing(&server, "cheap", 99_000),
        ],
    );
    let filters = SearchFilters {
        max_price: Some(300_000),
        ..SearchFilters::default()
    };

    let store = Arc::new(MemoryCatalogStore::new());
    let report = pipeline(search, Arc::new(NoExpansion), store, PipelineConfig::default())
        .run("bag under 300000", &filters)
        .await
        .expect("pipeline run");

    let prices: Vec<u64> = report.candidates().iter().map(|c| c.price).collect();
    assert_eq!(prices, vec![99_000, 250_000]);
}
