//! Pump.fun Adapter
//!
//! Paginated access to the pump.fun frontend API coin listing.
//!
//! # Example
//!
//! ```ignore
//! use pump_scraper::adapters::pump_fun::PumpFunClient;
//! use pump_scraper::domain::ListingQuery;
//! use pump_scraper::ports::TokenListingPort;
//!
//! let client = PumpFunClient::new()?;
//! let page = client.fetch_page(&ListingQuery::default(), 0, 50).await?;
//! for token in page {
//!     println!("{} ({}) - mcap: {} SOL", token.name, token.symbol, token.market_cap);
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /coins?offset&limit&sort&order&includeNsfw` - newest/sorted listing
//! - `GET /coins/search?searchTerm&type=exact&...` - exact-term search
//!
//! Both return a JSON array of coins. Timestamps are Unix milliseconds.

mod client;

pub use client::{decode_listing, PumpFunClient, PumpFunConfig, DEFAULT_PUMP_API_URL, DEFAULT_USER_AGENT};
