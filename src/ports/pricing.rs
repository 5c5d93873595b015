use async_trait::async_trait;

use super::UpstreamError;
use crate::domain::TokenPool;

/// Pool pricing lookup by pool id
#[async_trait]
pub trait PoolPricingPort: Send + Sync {
    /// `Ok(None)` when the pool is unknown to the pricing source
    async fn get_pool(&self, pool_id: &str) -> Result<Option<TokenPool>, UpstreamError>;
}
