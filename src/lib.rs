//! pump-scraper - pump.fun token scraper library
//!
//! Pages through the pump.fun coin listing, enriches graduated tokens with
//! GeckoTerminal pool pricing, and filters the merged records with a
//! composable condition engine.
//!
//! # Modules
//!
//! - `domain`: Condition engine, filter compiler, token records
//! - `ports`: Trait abstractions (TokenListingPort, PoolPricingPort, DatasetSink)
//! - `resilience`: Retry, error-to-value and swallow wrappers
//! - `adapters`: External implementations (pump.fun, GeckoTerminal, dataset, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Result merger and scrape runner

pub mod domain;
pub mod ports;
pub mod resilience;
pub mod adapters;
pub mod config;
pub mod application;
