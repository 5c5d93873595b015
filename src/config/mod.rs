//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    expand_path, load_config, load_optional_config, Config, ConfigError, GeckoTerminalSection,
    LoggingSection, PumpSection, ScraperSection,
};
