//! Pump.fun Listing Client
//!
//! Pages through the pump.fun frontend API coin listing (`/coins`) or its
//! exact-term search (`/coins/search`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER};
use reqwest::Client;
use tracing::debug;

use crate::domain::{ListingQuery, PumpToken};
use crate::ports::{TokenListingPort, UpstreamError};

/// Default pump.fun frontend API URL
pub const DEFAULT_PUMP_API_URL: &str = "https://frontend-api-v3.pump.fun";

/// Browser user agent; the frontend API rejects bare clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Maximum error body length kept in errors
const MAX_ERROR_BODY: usize = 512;

/// Configuration for the PumpFunClient
#[derive(Debug, Clone)]
pub struct PumpFunConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for PumpFunConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_PUMP_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PumpFunConfig {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }
}

/// Client for the pump.fun coin listing
#[derive(Debug, Clone)]
pub struct PumpFunClient {
    config: PumpFunConfig,
    http: Client,
}

impl PumpFunClient {
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_config(PumpFunConfig::default())
    }

    pub fn with_config(config: PumpFunConfig) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://pump.fun"));
        headers.insert(REFERER, HeaderValue::from_static("https://pump.fun/"));

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { config, http })
    }

    /// Endpoint URL and query parameters for one page
    fn page_request(&self, query: &ListingQuery, offset: u64, limit: u64) -> (String, Vec<(&'static str, String)>) {
        let base = self.config.api_url.trim_end_matches('/');
        let mut params = Vec::with_capacity(7);

        let url = match &query.term {
            Some(term) => {
                params.push(("searchTerm", term.clone()));
                params.push(("type", "exact".to_string()));
                format!("{}/coins/search", base)
            }
            None => format!("{}/coins", base),
        };

        params.push(("offset", offset.to_string()));
        params.push(("limit", limit.to_string()));
        params.push(("sort", query.sort.clone()));
        params.push(("order", query.order.as_str().to_string()));
        params.push(("includeNsfw", query.include_nsfw.to_string()));

        (url, params)
    }
}

#[async_trait]
impl TokenListingPort for PumpFunClient {
    async fn fetch_page(
        &self,
        query: &ListingQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PumpToken>, UpstreamError> {
        let (url, params) = self.page_request(query, offset, limit);
        debug!("GET {} offset={} limit={}", url, offset, limit);

        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(status.as_u16(), url, truncate(body)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::malformed(&url, e.to_string()))?;

        decode_listing(&url, body)
    }
}

/// Decode a listing payload, skipping items that do not parse
pub fn decode_listing(url: &str, body: serde_json::Value) -> Result<Vec<PumpToken>, UpstreamError> {
    let items = match body {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        other => {
            return Err(UpstreamError::malformed(
                url,
                format!("expected a JSON array, got {}", json_kind(&other)),
            ))
        }
    };

    let total = items.len();
    let tokens: Vec<PumpToken> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<PumpToken>(item) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!("Skipping undecodable listing item: {}", e);
                None
            }
        })
        .collect();

    if tokens.len() < total {
        debug!("Decoded {}/{} listing items from {}", tokens.len(), total, url);
    }

    Ok(tokens)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
