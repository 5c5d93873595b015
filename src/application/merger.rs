//! Result Merger
//!
//! Pages through the token listing, then enriches every graduated token with
//! its pool pricing. Page fetches are retried and fail the merge once
//! retries run out; pool lookups are retried and then swallowed, so one bad
//! pool never costs the other records.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{ListingQuery, PumpToken, ScrapedToken, TokenPool};
use crate::ports::{PoolPricingPort, TokenListingPort, UpstreamError};
use crate::resilience::{swallow_error, with_retry, ErrorContext, RetryPolicy};

/// Largest page the listing API serves
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Default bound on concurrent pool lookups
pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 4;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Listing fetch failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Merge cancelled")]
    Cancelled,
}

impl ErrorContext for MergeError {
    fn error_code(&self) -> String {
        match self {
            MergeError::Upstream(e) => e.error_code(),
            MergeError::Cancelled => "CANCELLED".to_string(),
        }
    }

    fn source_url(&self) -> Option<String> {
        match self {
            MergeError::Upstream(e) => e.source_url(),
            MergeError::Cancelled => None,
        }
    }
}

/// Configuration for the ResultMerger
#[derive(Debug, Clone)]
pub struct MergerConfig {
    /// Cap on records per listing request
    pub page_size: u64,
    pub max_concurrent_lookups: usize,
    pub enrich_pools: bool,
    /// Random pause between pages, `(min, max)`
    pub page_stagger: Option<(Duration, Duration)>,
    pub retry: RetryPolicy,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
            enrich_pools: true,
            page_stagger: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl MergerConfig {
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_concurrent_lookups(mut self, max: usize) -> Self {
        self.max_concurrent_lookups = max;
        self
    }

    pub fn with_enrich_pools(mut self, enabled: bool) -> Self {
        self.enrich_pools = enabled;
        self
    }

    pub fn with_page_stagger(mut self, min: Duration, max: Duration) -> Self {
        self.page_stagger = Some((min, max));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl From<&Config> for MergerConfig {
    fn from(config: &Config) -> Self {
        let [stagger_min, stagger_max] = config.scraper.page_stagger_ms;
        let page_stagger = (stagger_max > 0).then(|| {
            (
                Duration::from_millis(stagger_min),
                Duration::from_millis(stagger_max),
            )
        });

        Self {
            page_size: config.scraper.page_size,
            max_concurrent_lookups: config.scraper.max_concurrent_lookups,
            enrich_pools: config.scraper.enrich_pools,
            page_stagger,
            retry: config.retry.clone(),
        }
    }
}

/// Joins listing records with pool pricing
#[derive(Clone)]
pub struct ResultMerger {
    listing: Arc<dyn TokenListingPort>,
    pricing: Arc<dyn PoolPricingPort>,
    config: MergerConfig,
}

impl ResultMerger {
    pub fn new(
        listing: Arc<dyn TokenListingPort>,
        pricing: Arc<dyn PoolPricingPort>,
        config: MergerConfig,
    ) -> Self {
        Self {
            listing,
            pricing,
            config,
        }
    }

    pub fn config(&self) -> &MergerConfig {
        &self.config
    }

    /// Copy of this merger with pool enrichment switched on or off
    pub fn with_enrichment(&self, enabled: bool) -> Self {
        let mut merger = self.clone();
        merger.config.enrich_pools = enabled;
        merger
    }

    /// Fetch up to `query.limit` records starting at `query.offset`
    pub async fn fetch_primary_records(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<PumpToken>, UpstreamError> {
        let total = query.limit;
        let page_size = total.min(self.config.page_size.max(1));
        let mut records: Vec<PumpToken> = Vec::new();
        let mut offset = query.offset;

        while (records.len() as u64) < total {
            let remaining = total - records.len() as u64;
            let request = page_size.min(remaining);

            let page = with_retry(&self.config.retry, UpstreamError::is_retryable, || {
                self.listing.fetch_page(query, offset, request)
            })
            .await?;

            if page.is_empty() {
                debug!("Empty page at offset {}, listing exhausted", offset);
                break;
            }

            records.extend(page);
            offset = match offset.checked_add(request) {
                Some(next) => next,
                None => {
                    warn!("Offset overflow after {}, stopping pagination", offset);
                    break;
                }
            };
            debug!("{} total records, next offset {}", records.len(), offset);

            if (records.len() as u64) < total {
                self.stagger().await;
            }
        }

        records.truncate(total as usize);
        Ok(records)
    }

    /// Pool pricing for a graduated token; `None` when skipped or failed
    pub async fn enrich_with_pool(&self, token: &PumpToken) -> Option<TokenPool> {
        if !self.config.enrich_pools {
            return None;
        }

        let Some(pool_id) = token.pool_reference() else {
            debug!(
                "{} skipped (pool={:?}, graduated={})",
                token.symbol, token.raydium_pool, token.complete
            );
            return None;
        };

        debug!("Processing: {} ({})...", token.symbol, token.mint);
        let label = format!("Pool lookup for {} ({})", token.symbol, pool_id);
        let pool = swallow_error(
            &label,
            with_retry(&self.config.retry, UpstreamError::is_retryable, || {
                self.pricing.get_pool(pool_id)
            }),
        )
        .await
        .flatten();

        debug!(
            "Processing: {} ({})...[{}]",
            token.symbol,
            token.mint,
            if pool.is_some() { "done" } else { "skipped" }
        );
        pool
    }

    /// Fetch and enrich, one output record per listing record, in order
    pub async fn merge_results(&self, query: &ListingQuery) -> Result<Vec<ScrapedToken>, MergeError> {
        let tokens = self.fetch_primary_records(query).await?;
        info!(
            "Fetched {} tokens, enriching with up to {} concurrent lookups",
            tokens.len(),
            self.config.max_concurrent_lookups
        );

        let merged: Vec<ScrapedToken> = stream::iter(tokens)
            .map(|token| async move {
                let pool = self.enrich_with_pool(&token).await;
                ScrapedToken::new(token, pool, Utc::now())
            })
            .buffered(self.config.max_concurrent_lookups.max(1))
            .collect()
            .await;

        let enriched = merged.iter().filter(|r| r.has_pool()).count();
        info!("Merged {} records ({} with pool data)", merged.len(), enriched);
        Ok(merged)
    }

    /// Like `merge_results`, abandoning all outstanding work once `shutdown` resolves
    pub async fn merge_results_until<S>(
        &self,
        query: &ListingQuery,
        shutdown: S,
    ) -> Result<Vec<ScrapedToken>, MergeError>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            result = self.merge_results(query) => result,
            _ = shutdown => {
                warn!("Shutdown requested, cancelling merge");
                Err(MergeError::Cancelled)
            }
        }
    }

    async fn stagger(&self) {
        let Some((min, max)) = self.config.page_stagger else {
            return;
        };
        let wait = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        if !wait.is_zero() {
            debug!("Staggering next page by {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
