//! Token Records
//!
//! pump.fun coin listings, GeckoTerminal pool pricing, and the merged record
//! the scraper emits. `ScrapedToken` exposes its fields to the condition
//! engine through a static field table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::{FieldTable, Record, Value};

/// Coin listing entry from the pump.fun frontend API.
///
/// Timestamps arrive as Unix milliseconds and are emitted as RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpToken {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creator: String,
    /// Market cap in SOL
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub usd_market_cap: f64,
    #[serde(default, deserialize_with = "chrono::serde::ts_milliseconds_option::deserialize")]
    pub created_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub metadata_uri: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub bonding_curve: Option<String>,
    #[serde(default)]
    pub associated_bonding_curve: Option<String>,
    /// Raydium pool id, set once the bonding curve completes
    #[serde(default)]
    pub raydium_pool: Option<String>,
    /// Bonding curve completed (token graduated)
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub virtual_sol_reserves: u64,
    #[serde(default)]
    pub virtual_token_reserves: u64,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub total_supply: u64,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub show_name: bool,
    #[serde(default, deserialize_with = "chrono::serde::ts_milliseconds_option::deserialize")]
    pub last_trade_timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "chrono::serde::ts_milliseconds_option::deserialize")]
    pub king_of_the_hill_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default, deserialize_with = "chrono::serde::ts_milliseconds_option::deserialize")]
    pub last_reply: Option<DateTime<Utc>>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub market_id: Option<String>,
    #[serde(default)]
    pub inverted: Option<bool>,
    #[serde(default)]
    pub is_currently_live: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl PumpToken {
    /// Create a token with only identity fields set
    pub fn new(mint: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            name: name.into(),
            symbol: symbol.into(),
            description: None,
            creator: String::new(),
            market_cap: 0.0,
            usd_market_cap: 0.0,
            created_timestamp: None,
            image_uri: None,
            metadata_uri: None,
            twitter: None,
            telegram: None,
            bonding_curve: None,
            associated_bonding_curve: None,
            raydium_pool: None,
            complete: false,
            virtual_sol_reserves: 0,
            virtual_token_reserves: 0,
            hidden: None,
            total_supply: 0,
            website: None,
            show_name: true,
            last_trade_timestamp: None,
            king_of_the_hill_timestamp: None,
            reply_count: 0,
            last_reply: None,
            nsfw: false,
            market_id: None,
            inverted: None,
            is_currently_live: false,
            username: None,
            profile_image: None,
        }
    }

    /// Mark the token graduated into the given Raydium pool
    pub fn graduated(mut self, pool_id: impl Into<String>) -> Self {
        self.complete = true;
        self.raydium_pool = Some(pool_id.into());
        self
    }

    /// Pool to price this token against: the Raydium pool of a graduated token
    pub fn pool_reference(&self) -> Option<&str> {
        if !self.complete {
            return None;
        }
        self.raydium_pool.as_deref().filter(|id| !id.is_empty())
    }
}

/// Pool pricing summary attached to graduated tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPool {
    pub pool_name: String,
    /// Price in USD
    pub price: f64,
    /// 24h price change in percent
    pub price_change_24h: f64,
}

/// Merged output record: listing fields, optional pool pricing, scrape time
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScrapedToken {
    #[serde(flatten)]
    pub token: PumpToken,
    #[serde(flatten)]
    pub pool: Option<TokenPool>,
    pub scraped_date: DateTime<Utc>,
}

impl ScrapedToken {
    pub fn new(token: PumpToken, pool: Option<TokenPool>, scraped_date: DateTime<Utc>) -> Self {
        Self { token, pool, scraped_date }
    }

    pub fn has_pool(&self) -> bool {
        self.pool.is_some()
    }
}

/// Filterable fields of a scraped token
pub static SCRAPED_TOKEN_FIELDS: FieldTable<ScrapedToken> = FieldTable::new(&[
    ("mint", |t: &ScrapedToken| Value::from(t.token.mint.clone())),
    ("name", |t: &ScrapedToken| Value::from(t.token.name.clone())),
    ("symbol", |t: &ScrapedToken| Value::from(t.token.symbol.clone())),
    ("description", |t: &ScrapedToken| Value::from(t.token.description.clone())),
    ("creator", |t: &ScrapedToken| Value::from(t.token.creator.clone())),
    ("market_cap", |t: &ScrapedToken| Value::from(t.token.market_cap)),
    ("usd_market_cap", |t: &ScrapedToken| Value::from(t.token.usd_market_cap)),
    ("created_timestamp", |t: &ScrapedToken| Value::from(t.token.created_timestamp)),
    ("image_uri", |t: &ScrapedToken| Value::from(t.token.image_uri.clone())),
    ("metadata_uri", |t: &ScrapedToken| Value::from(t.token.metadata_uri.clone())),
    ("twitter", |t: &ScrapedToken| Value::from(t.token.twitter.clone())),
    ("telegram", |t: &ScrapedToken| Value::from(t.token.telegram.clone())),
    ("bonding_curve", |t: &ScrapedToken| Value::from(t.token.bonding_curve.clone())),
    ("associated_bonding_curve", |t: &ScrapedToken| {
        Value::from(t.token.associated_bonding_curve.clone())
    }),
    ("raydium_pool", |t: &ScrapedToken| Value::from(t.token.raydium_pool.clone())),
    ("complete", |t: &ScrapedToken| Value::from(t.token.complete)),
    ("virtual_sol_reserves", |t: &ScrapedToken| Value::from(t.token.virtual_sol_reserves)),
    ("virtual_token_reserves", |t: &ScrapedToken| Value::from(t.token.virtual_token_reserves)),
    ("hidden", |t: &ScrapedToken| Value::from(t.token.hidden)),
    ("total_supply", |t: &ScrapedToken| Value::from(t.token.total_supply)),
    ("website", |t: &ScrapedToken| Value::from(t.token.website.clone())),
    ("show_name", |t: &ScrapedToken| Value::from(t.token.show_name)),
    ("last_trade_timestamp", |t: &ScrapedToken| Value::from(t.token.last_trade_timestamp)),
    ("king_of_the_hill_timestamp", |t: &ScrapedToken| {
        Value::from(t.token.king_of_the_hill_timestamp)
    }),
    ("reply_count", |t: &ScrapedToken| Value::from(t.token.reply_count)),
    ("last_reply", |t: &ScrapedToken| Value::from(t.token.last_reply)),
    ("nsfw", |t: &ScrapedToken| Value::from(t.token.nsfw)),
    ("market_id", |t: &ScrapedToken| Value::from(t.token.market_id.clone())),
    ("inverted", |t: &ScrapedToken| Value::from(t.token.inverted)),
    ("is_currently_live", |t: &ScrapedToken| Value::from(t.token.is_currently_live)),
    ("username", |t: &ScrapedToken| Value::from(t.token.username.clone())),
    ("profile_image", |t: &ScrapedToken| Value::from(t.token.profile_image.clone())),
    ("pool_name", |t: &ScrapedToken| {
        Value::from(t.pool.as_ref().map(|p| p.pool_name.clone()))
    }),
    ("price", |t: &ScrapedToken| Value::from(t.pool.as_ref().map(|p| p.price))),
    ("price_change_24h", |t: &ScrapedToken| {
        Value::from(t.pool.as_ref().map(|p| p.price_change_24h))
    }),
    ("scraped_date", |t: &ScrapedToken| Value::from(t.scraped_date)),
]);

impl Record for ScrapedToken {
    fn field(&self, name: &str) -> Option<Value> {
        SCRAPED_TOKEN_FIELDS.resolve(self, name)
    }
}
