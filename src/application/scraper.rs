//! Pump Scraper
//!
//! One scrape run: compile the input arguments, merge listing and pool
//! data, then keep the records the compiled predicate accepts. `run` is the
//! failure boundary and always ends with either records or one `ApiError`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use super::merger::{MergeError, MergerConfig, ResultMerger};
use crate::adapters::gecko_terminal::GeckoTerminalClient;
use crate::adapters::pump_fun::PumpFunClient;
use crate::config::Config;
use crate::domain::{compile, ConditionError, FilterArgs, FilterError, QueryFragment, ScrapedToken};
use crate::ports::{DatasetSink, SinkError, UpstreamError};
use crate::resilience::{error_to_value, ApiError, ErrorContext};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid input: {0}")]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Filter evaluation failed: {0}")]
    Condition(#[from] ConditionError),

    #[error("Client setup failed: {0}")]
    Client(#[from] UpstreamError),
}

impl ErrorContext for ScrapeError {
    fn error_code(&self) -> String {
        match self {
            ScrapeError::Filter(_) => "INVALID_INPUT".to_string(),
            ScrapeError::Merge(e) => e.error_code(),
            ScrapeError::Condition(_) => "INVALID_FILTER".to_string(),
            ScrapeError::Client(e) => e.error_code(),
        }
    }

    fn source_url(&self) -> Option<String> {
        match self {
            ScrapeError::Merge(e) => e.source_url(),
            ScrapeError::Client(e) => e.source_url(),
            _ => None,
        }
    }
}

/// Top-level scrape runner
#[derive(Clone)]
pub struct PumpScraper {
    merger: ResultMerger,
    run_timeout: Option<Duration>,
}

impl PumpScraper {
    pub fn new(merger: ResultMerger) -> Self {
        Self {
            merger,
            run_timeout: None,
        }
    }

    /// Build the pump.fun and GeckoTerminal clients from configuration
    pub fn from_config(config: &Config) -> Result<Self, ScrapeError> {
        let listing = PumpFunClient::with_config(config.pump.client_config())?;
        let pricing = GeckoTerminalClient::with_config(config.gecko_terminal.client_config())?;
        let merger = ResultMerger::new(
            Arc::new(listing),
            Arc::new(pricing),
            MergerConfig::from(config),
        );

        Ok(Self::new(merger).with_run_timeout(config.scraper.run_timeout()))
    }

    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn merger(&self) -> &ResultMerger {
        &self.merger
    }

    /// Scrape and filter; errors propagate
    pub async fn collect(&self, args: &FilterArgs) -> Result<Vec<ScrapedToken>, ScrapeError> {
        self.collect_until(args, std::future::pending()).await
    }

    /// Like `collect`, cancelled once `shutdown` resolves
    pub async fn collect_until<S>(
        &self,
        args: &FilterArgs,
        shutdown: S,
    ) -> Result<Vec<ScrapedToken>, ScrapeError>
    where
        S: Future<Output = ()>,
    {
        let input = compile(args)?;
        info!("Scraping with {:?}", input.query);
        info!("Filter: {}", input.filter);

        let merger = match input.enrich_pools {
            Some(enabled) => self.merger.with_enrichment(enabled),
            None => self.merger.clone(),
        };

        let merge = merger.merge_results_until(&input.query, shutdown);
        let merged = match self.run_timeout {
            Some(limit) => tokio::time::timeout(limit, merge)
                .await
                .map_err(|_| MergeError::Cancelled)??,
            None => merge.await?,
        };

        let total = merged.len();
        let kept = input.filter.filter(merged)?;
        info!("{} of {} records passed the filter", kept.len(), total);
        Ok(kept)
    }

    /// Scrape and filter, reporting any failure as an `ApiError`
    pub async fn run(&self, args: &FilterArgs) -> Result<Vec<ScrapedToken>, ApiError> {
        error_to_value(self.collect(args)).await
    }

    /// Like `run`, cancelled once `shutdown` resolves
    pub async fn run_until<S>(
        &self,
        args: &FilterArgs,
        shutdown: S,
    ) -> Result<Vec<ScrapedToken>, ApiError>
    where
        S: Future<Output = ()>,
    {
        error_to_value(self.collect_until(args, shutdown)).await
    }

    /// Render the compiled filter as a parameterized query
    pub fn explain(&self, args: &FilterArgs) -> Result<QueryFragment, ScrapeError> {
        explain(args)
    }
}

/// Compile `args` and render the filter; needs no clients or network
pub fn explain(args: &FilterArgs) -> Result<QueryFragment, ScrapeError> {
    Ok(compile(args)?.filter.render_query()?)
}

/// Push a run outcome to the dataset: the records, or the single error
pub async fn publish(
    sink: &dyn DatasetSink,
    outcome: &Result<Vec<ScrapedToken>, ApiError>,
) -> Result<usize, SinkError> {
    match outcome {
        Ok(records) => sink.push_records(records).await,
        Err(error) => {
            sink.push_error(error).await?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PumpToken, Record, TokenPool, Value};
    use crate::ports::mocks::{MockListing, MockPricing};
    use crate::ports::sink::MockDatasetSink;
    use crate::resilience::RetryPolicy;
    use serde_json::json;

    fn args(value: serde_json::Value) -> FilterArgs {
        value.as_object().cloned().unwrap()
    }

    fn tokens() -> Vec<PumpToken> {
        let mut cheap = PumpToken::new("mint-a", "Alpha", "ALPHA");
        cheap.market_cap = 30.0;
        let mut graduated = PumpToken::new("mint-b", "Beta", "BETA").graduated("pool-b");
        graduated.market_cap = 400.0;
        let mut big = PumpToken::new("mint-c", "Gamma", "GAMMA");
        big.market_cap = 90.0;
        vec![cheap, graduated, big]
    }

    fn scraper(listing: Arc<MockListing>, pricing: Arc<MockPricing>) -> PumpScraper {
        let config = MergerConfig::default()
            .with_retry(RetryPolicy::default().with_initial_delay(Duration::from_millis(5)));
        PumpScraper::new(ResultMerger::new(listing, pricing, config))
    }

    fn beta_pool() -> TokenPool {
        TokenPool {
            pool_name: "BETA / SOL".into(),
            price: 0.01,
            price_change_24h: 12.0,
        }
    }

    #[tokio::test]
    async fn test_collect_filters_merged_records() {
        let listing = Arc::new(MockListing::new().with_records(tokens()));
        let pricing = Arc::new(MockPricing::new().with_pool("pool-b", beta_pool()));

        let kept = scraper(listing, pricing.clone())
            .collect(&args(json!({ "min_mkt_cap": 50, "limit": 10 })))
            .await
            .unwrap();

        let mints: Vec<_> = kept.iter().map(|r| r.token.mint.as_str()).collect();
        assert_eq!(mints, vec!["mint-b", "mint-c"]);
        assert_eq!(kept[0].pool, Some(beta_pool()));
        assert_eq!(pricing.get_calls(), vec!["pool-b"]);
    }

    #[tokio::test]
    async fn test_collect_filters_on_pool_fields() {
        let listing = Arc::new(MockListing::new().with_records(tokens()));
        let pricing = Arc::new(MockPricing::new().with_pool("pool-b", beta_pool()));

        let kept = scraper(listing, pricing)
            .collect(&args(json!({ "has_pool_name": true })))
            .await
            .unwrap();

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].field("price"), Some(Value::Float(0.01)));
    }

    #[tokio::test]
    async fn test_with_pool_data_false_skips_enrichment() {
        let listing = Arc::new(MockListing::new().with_records(tokens()));
        let pricing = Arc::new(MockPricing::new().with_pool("pool-b", beta_pool()));

        let kept = scraper(listing, pricing.clone())
            .collect(&args(json!({ "with_pool_data": false })))
            .await
            .unwrap();

        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| r.pool.is_none()));
        assert_eq!(pricing.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_fails_before_fetching() {
        let listing = Arc::new(MockListing::new().with_records(tokens()));
        let scraper = scraper(listing.clone(), Arc::new(MockPricing::new()));

        let err = scraper
            .collect(&args(json!({ "min_holders": 3 })))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Filter(FilterError::UnknownField { .. })));
        assert!(listing.get_calls().is_empty());

        let api_error = scraper.run(&args(json!({ "min_holders": 3 }))).await.unwrap_err();
        assert_eq!(api_error.error_code, "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_type_mismatch_surfaces_as_condition_error() {
        let listing = Arc::new(MockListing::new().with_records(tokens()));
        let scraper = scraper(listing, Arc::new(MockPricing::new()));

        let err = scraper
            .collect(&args(json!({ "min_mkt_cap": "lots" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Condition(ConditionError::TypeMismatch { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_listing_failure_as_api_error() {
        let listing = Arc::new(MockListing::new().with_records(tokens()).with_failures(3, 503));
        let scraper = scraper(listing.clone(), Arc::new(MockPricing::new()));

        let error = scraper.run(&FilterArgs::new()).await.unwrap_err();
        assert_eq!(error.error_code, "HTTP_503");
        assert_eq!(error.url.as_deref(), Some("mock://listing/coins"));
        assert_eq!(listing.get_calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_timeout_cancels() {
        let listing = Arc::new(MockListing::new().with_records(tokens()));
        let pricing = Arc::new(MockPricing::new().with_delay(Duration::from_secs(30)));
        let scraper = scraper(listing, pricing).with_run_timeout(Some(Duration::from_secs(5)));

        let error = scraper.run(&FilterArgs::new()).await.unwrap_err();
        assert_eq!(error.error_code, "CANCELLED");
    }

    #[test]
    fn test_explain_renders_filter() {
        let scraper = scraper(Arc::new(MockListing::new()), Arc::new(MockPricing::new()));

        let fragment = scraper
            .explain(&args(json!({ "is_graduated": "yes", "limit": 5 })))
            .unwrap();
        assert_eq!(fragment.template, "(1=1) AND (complete = ?)");
        assert_eq!(fragment.bindings, vec![Value::Bool(true)]);
    }

    #[test]
    fn test_explain_needs_no_scraper() {
        let fragment = explain(&args(json!({ "min_reply_count": 10, "has_twitter": false }))).unwrap();
        assert_eq!(fragment.bindings, vec![Value::Int(10)]);
        assert!(fragment.template.contains("reply_count >= ?"));
        assert!(fragment.template.contains("twitter IS NULL"));

        let err = explain(&args(json!({ "min_holders": 3 }))).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_publish_records() {
        let mut sink = MockDatasetSink::new();
        sink.expect_push_records()
            .withf(|records| records.len() == 3)
            .times(1)
            .returning(|records| Ok(records.len()));
        sink.expect_push_error().never();

        let listing = Arc::new(MockListing::new().with_records(tokens()));
        let outcome = scraper(listing, Arc::new(MockPricing::new()))
            .run(&FilterArgs::new())
            .await;

        assert_eq!(publish(&sink, &outcome).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_publish_error() {
        let mut sink = MockDatasetSink::new();
        sink.expect_push_records().never();
        sink.expect_push_error()
            .withf(|error| error.error_code == "HTTP_404")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = Err(ApiError::new("HTTP_404", "not found"));
        assert_eq!(publish(&sink, &outcome).await.unwrap(), 0);
    }
}
