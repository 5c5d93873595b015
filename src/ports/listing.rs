use async_trait::async_trait;

use super::UpstreamError;
use crate::domain::{ListingQuery, PumpToken};

/// Paginated token listing source
#[async_trait]
pub trait TokenListingPort: Send + Sync {
    /// Fetch one page of `limit` records starting at `offset`.
    ///
    /// The query's own `offset`/`limit` describe the whole run and are
    /// ignored here. An empty page means the listing is exhausted.
    async fn fetch_page(
        &self,
        query: &ListingQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PumpToken>, UpstreamError>;
}
