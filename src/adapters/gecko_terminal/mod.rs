//! GeckoTerminal Adapter
//!
//! Pool pricing (`price_in_usd`, 24h percent change) for graduated tokens,
//! read from `GET /{network}/pools/{id}?include=pairs&base_token=0`.

mod client;
mod types;

pub use client::{GeckoTerminalClient, GeckoTerminalConfig, DEFAULT_GECKO_TERMINAL_API_URL};
pub use types::{convert_percentage, PoolAttributes, PoolData, PoolResponse};
