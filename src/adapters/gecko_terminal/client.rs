//! GeckoTerminal Pool Client
//!
//! Looks up pool pricing for graduated pump.fun tokens.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::types::PoolResponse;
use crate::adapters::pump_fun::DEFAULT_USER_AGENT;
use crate::domain::TokenPool;
use crate::ports::{PoolPricingPort, UpstreamError};

/// Default GeckoTerminal app API URL
pub const DEFAULT_GECKO_TERMINAL_API_URL: &str = "https://app.geckoterminal.com/api/p1";

/// Configuration for the GeckoTerminalClient
#[derive(Debug, Clone)]
pub struct GeckoTerminalConfig {
    pub api_url: String,
    /// Network segment of the pool URL
    pub network: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GeckoTerminalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GECKO_TERMINAL_API_URL.to_string(),
            network: "solana".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Client for GeckoTerminal pool lookups
#[derive(Debug, Clone)]
pub struct GeckoTerminalClient {
    config: GeckoTerminalConfig,
    http: Client,
}

impl GeckoTerminalClient {
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_config(GeckoTerminalConfig::default())
    }

    pub fn with_config(config: GeckoTerminalConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, http })
    }

    fn pool_url(&self, pool_id: &str) -> String {
        format!(
            "{}/{}/pools/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.network,
            pool_id
        )
    }
}

#[async_trait]
impl PoolPricingPort for GeckoTerminalClient {
    async fn get_pool(&self, pool_id: &str) -> Result<Option<TokenPool>, UpstreamError> {
        if pool_id.is_empty() {
            return Ok(None);
        }

        let url = self.pool_url(pool_id);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("include", "pairs"), ("base_token", "0")])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("Pool {} not found", pool_id);
                Ok(None)
            }
            status if status.is_success() => {
                let body: PoolResponse = response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::malformed(&url, e.to_string()))?;
                Ok(Some(body.into_token_pool()))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                let body: String = body.chars().take(512).collect();
                Err(UpstreamError::status(status.as_u16(), url, body))
            }
        }
    }
}
