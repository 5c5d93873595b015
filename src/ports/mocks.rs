//! Recording mocks for the listing and pricing ports
//!
//! Used by unit and integration tests to drive the merger without network
//! access. Every call is recorded for later assertions.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{PoolPricingPort, TokenListingPort, UpstreamError};
use crate::domain::{ListingQuery, PumpToken, TokenPool};

/// Mock listing serving pages out of a fixed record set
#[derive(Debug, Default)]
pub struct MockListing {
    records: Vec<PumpToken>,
    calls: Arc<Mutex<Vec<(u64, u64)>>>,
    failures_remaining: Arc<AtomicU32>,
    failure_status: u16,
}

impl MockListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the records behind the listing
    pub fn with_records(mut self, records: Vec<PumpToken>) -> Self {
        self.records = records;
        self
    }

    /// Builder method to serve `count` generated, non-graduated tokens
    pub fn with_generated(self, count: usize) -> Self {
        let records = (0..count)
            .map(|i| PumpToken::new(format!("mint-{}", i), format!("Token {}", i), format!("T{}", i)))
            .collect();
        self.with_records(records)
    }

    /// Builder method to fail the next `count` calls with the given status
    pub fn with_failures(mut self, count: u32, status: u16) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self.failure_status = status;
        self
    }

    /// Get all recorded `(offset, limit)` calls
    pub fn get_calls(&self) -> Vec<(u64, u64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenListingPort for MockListing {
    async fn fetch_page(
        &self,
        _query: &ListingQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PumpToken>, UpstreamError> {
        self.calls.lock().unwrap().push((offset, limit));

        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(UpstreamError::status(
                self.failure_status,
                "mock://listing/coins",
                "injected failure",
            ));
        }

        let start = (offset as usize).min(self.records.len());
        let end = start.saturating_add(limit as usize).min(self.records.len());
        Ok(self.records[start..end].to_vec())
    }
}

/// Mock pool pricing with per-pool responses
#[derive(Debug, Default)]
pub struct MockPricing {
    pools: HashMap<String, TokenPool>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPricing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the pool returned for an id
    pub fn with_pool(mut self, pool_id: &str, pool: TokenPool) -> Self {
        self.pools.insert(pool_id.to_string(), pool);
        self
    }

    /// Builder method to make lookups of an id always fail with a 500
    pub fn with_failing_pool(mut self, pool_id: &str) -> Self {
        self.failing.insert(pool_id.to_string());
        self
    }

    /// Builder method to delay every lookup
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all recorded pool ids
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PoolPricingPort for MockPricing {
    async fn get_pool(&self, pool_id: &str) -> Result<Option<TokenPool>, UpstreamError> {
        self.calls.lock().unwrap().push(pool_id.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(pool_id) {
            return Err(UpstreamError::status(
                500,
                format!("mock://pricing/pools/{}", pool_id),
                "injected failure",
            ));
        }

        Ok(self.pools.get(pool_id).cloned())
    }
}
