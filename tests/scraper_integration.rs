//! Scraper Integration Tests
//!
//! Integration tests that verify the scraping components work together:
//! 1. Filter arguments -> compiled listing query and predicate
//! 2. ResultMerger pagination and pool enrichment over mock ports
//! 3. PumpScraper run boundary (records or a single ApiError)
//! 4. JsonLinesSink output of the run outcome
//!
//! All tests are deterministic (no real network calls) and use mock data.

use std::sync::Arc;
use std::time::Duration;

use pump_scraper::adapters::dataset::JsonLinesSink;
use pump_scraper::application::{publish, MergerConfig, PumpScraper, ResultMerger};
use pump_scraper::domain::{compile, FilterArgs, ListingQuery, PumpToken, TokenPool, Value};
use pump_scraper::ports::mocks::{MockListing, MockPricing};
use pump_scraper::resilience::RetryPolicy;
use regex::Regex;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

fn args(value: serde_json::Value) -> FilterArgs {
    value.as_object().cloned().expect("fixture args must be an object")
}

/// Short retry delays so paused-clock tests stay readable
fn fast_retry() -> RetryPolicy {
    RetryPolicy::default().with_initial_delay(Duration::from_millis(10))
}

fn merger(listing: Arc<MockListing>, pricing: Arc<MockPricing>) -> ResultMerger {
    ResultMerger::new(listing, pricing, MergerConfig::default().with_retry(fast_retry()))
}

fn scraper(listing: Arc<MockListing>, pricing: Arc<MockPricing>) -> PumpScraper {
    PumpScraper::new(merger(listing, pricing))
}

fn pool(name: &str, price: f64) -> TokenPool {
    TokenPool {
        pool_name: name.to_string(),
        price,
        price_change_24h: -3.5,
    }
}

/// Five tokens; the even ones graduated with a pool id
fn mixed_tokens() -> Vec<PumpToken> {
    (0..5)
        .map(|i| {
            let mut token = PumpToken::new(format!("mint-{}", i), format!("Token {}", i), format!("T{}", i));
            token.usd_market_cap = 10_000.0 * (i + 1) as f64;
            if i % 2 == 0 {
                token = token.graduated(format!("pool-{}", i));
            }
            token
        })
        .collect()
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_pages_through_listing_in_fixed_sizes() {
    let listing = Arc::new(MockListing::new().with_generated(500));
    let merger = merger(listing.clone(), Arc::new(MockPricing::new()));

    let records = merger
        .fetch_primary_records(&ListingQuery::default().with_limit(120))
        .await
        .unwrap();

    assert_eq!(records.len(), 120);
    assert_eq!(listing.get_calls(), vec![(0, 50), (50, 50), (100, 20)]);
    assert_eq!(records[0].mint, "mint-0");
    assert_eq!(records[119].mint, "mint-119");
}

#[tokio::test]
async fn test_short_listing_stops_on_empty_page() {
    let listing = Arc::new(MockListing::new().with_generated(30));
    let merger = merger(listing.clone(), Arc::new(MockPricing::new()));

    let records = merger
        .fetch_primary_records(&ListingQuery::default().with_limit(100))
        .await
        .unwrap();

    assert_eq!(records.len(), 30);
    assert_eq!(listing.get_calls(), vec![(0, 50), (50, 50)]);
}

// ============================================================================
// Enrichment
// ============================================================================

#[tokio::test]
async fn test_only_graduated_tokens_are_looked_up() {
    let listing = Arc::new(MockListing::new().with_records(mixed_tokens()));
    let pricing = Arc::new(
        MockPricing::new()
            .with_pool("pool-0", pool("T0 / SOL", 0.1))
            .with_pool("pool-2", pool("T2 / SOL", 0.2))
            .with_pool("pool-4", pool("T4 / SOL", 0.4)),
    );

    let records = merger(listing, pricing.clone())
        .merge_results(&ListingQuery::default().with_limit(5))
        .await
        .unwrap();

    let mut calls = pricing.get_calls();
    calls.sort();
    assert_eq!(calls, vec!["pool-0", "pool-2", "pool-4"]);

    let enriched: Vec<bool> = records.iter().map(|r| r.has_pool()).collect();
    assert_eq!(enriched, vec![true, false, true, false, true]);
}

#[tokio::test]
async fn test_no_lookups_when_nothing_graduated() {
    let listing = Arc::new(MockListing::new().with_generated(20));
    let pricing = Arc::new(MockPricing::new());

    let records = merger(listing, pricing.clone())
        .merge_results(&ListingQuery::default().with_limit(20))
        .await
        .unwrap();

    assert_eq!(records.len(), 20);
    assert_eq!(pricing.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_lookup_is_isolated() {
    let listing = Arc::new(MockListing::new().with_records(mixed_tokens()));
    let pricing = Arc::new(
        MockPricing::new()
            .with_pool("pool-0", pool("T0 / SOL", 0.1))
            .with_failing_pool("pool-2")
            .with_pool("pool-4", pool("T4 / SOL", 0.4)),
    );

    let records = merger(listing, pricing.clone())
        .merge_results(&ListingQuery::default().with_limit(5))
        .await
        .unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(records[0].pool, Some(pool("T0 / SOL", 0.1)));
    assert_eq!(records[2].pool, None);
    assert_eq!(records[4].pool, Some(pool("T4 / SOL", 0.4)));

    // one attempt each for pool-0 and pool-4, three for the failing pool
    assert_eq!(pricing.call_count(), 5);
}

// ============================================================================
// Run boundary
// ============================================================================

#[tokio::test]
async fn test_run_applies_filter_arguments() {
    let listing = Arc::new(MockListing::new().with_records(mixed_tokens()));
    let pricing = Arc::new(MockPricing::new().with_pool("pool-2", pool("T2 / SOL", 0.2)));

    let kept = scraper(listing, pricing)
        .run(&args(json!({
            "limit": 5,
            "is_graduated": true,
            "min_mkt_cap": 20000,
            "is_mkt_cap_usd": true,
            "has_twitter": "both",
        })))
        .await
        .unwrap();

    let mints: Vec<&str> = kept.iter().map(|r| r.token.mint.as_str()).collect();
    assert_eq!(mints, vec!["mint-2", "mint-4"]);
    assert!(kept[0].has_pool());
    assert!(!kept[1].has_pool());
}

#[tokio::test(start_paused = true)]
async fn test_run_listing_failure_yields_single_error() {
    let listing = Arc::new(MockListing::new().with_generated(10).with_failures(5, 502));
    let scraper = scraper(listing.clone(), Arc::new(MockPricing::new()));

    let error = scraper.run(&args(json!({ "limit": 10 }))).await.unwrap_err();

    assert_eq!(error.error_code, "HTTP_502");
    assert!(error.message.contains("502"));
    assert_eq!(listing.get_calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_until_shutdown_cancels_outstanding_lookups() {
    let listing = Arc::new(MockListing::new().with_records(mixed_tokens()));
    let pricing = Arc::new(
        MockPricing::new()
            .with_pool("pool-0", pool("T0 / SOL", 0.1))
            .with_delay(Duration::from_secs(60)),
    );
    let scraper = scraper(listing, pricing);

    let error = scraper
        .run_until(&FilterArgs::new(), tokio::time::sleep(Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert_eq!(error.error_code, "CANCELLED");
}

#[test]
fn test_explain_matches_compiled_filter() {
    let input = args(json!({
        "limit": 25,
        "filter": "pepe",
        "is_graduated": false,
        "min_mkt_cap": 1000,
        "max_mkt_cap": 5000,
        "is_mkt_cap_usd": "yes",
    }));

    let compiled = compile(&input).unwrap();
    assert_eq!(compiled.query.limit, 25);
    assert_eq!(compiled.query.term.as_deref(), Some("pepe"));
    assert_eq!(compiled.filter.condition_count(), 3);

    let scraper = scraper(Arc::new(MockListing::new()), Arc::new(MockPricing::new()));
    let fragment = scraper.explain(&input).unwrap();

    let placeholders = Regex::new(r"\?").unwrap();
    assert_eq!(placeholders.find_iter(&fragment.template).count(), fragment.bindings.len());
    assert!(fragment.template.contains("complete = ?"));
    assert!(fragment.template.contains("usd_market_cap >= ?"));
    assert!(fragment.template.contains("usd_market_cap <= ?"));
    assert!(fragment.bindings.contains(&Value::Bool(false)));
}

// ============================================================================
// Dataset output
// ============================================================================

#[tokio::test]
async fn test_records_written_as_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.jsonl");
    let sink = JsonLinesSink::file(&path);

    let listing = Arc::new(MockListing::new().with_records(mixed_tokens()));
    let pricing = Arc::new(MockPricing::new().with_pool("pool-0", pool("T0 / SOL", 0.1)));
    let outcome = scraper(listing, pricing).run(&args(json!({ "limit": 3 }))).await;

    assert_eq!(publish(&sink, &outcome).await.unwrap(), 3);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["mint"], json!("mint-0"));
    assert_eq!(lines[0]["pool_name"], json!("T0 / SOL"));
    assert!(lines[0]["scraped_date"].is_string());
    assert!(lines[1].get("pool_name").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_error_written_as_single_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.jsonl");
    let sink = JsonLinesSink::file(&path);

    let listing = Arc::new(MockListing::new().with_failures(3, 429));
    let outcome = scraper(listing, Arc::new(MockPricing::new()))
        .run(&FilterArgs::new())
        .await;

    assert_eq!(publish(&sink, &outcome).await.unwrap(), 0);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);

    let error: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(error["error_code"], json!("HTTP_429"));
    assert_eq!(error["url"], json!("mock://listing/coins"));
}
