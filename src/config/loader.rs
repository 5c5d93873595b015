//! Configuration Loader
//!
//! Loads and validates scraper configuration from TOML files. Every section
//! has defaults, so a missing file or section means default behaviour.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::gecko_terminal::{GeckoTerminalConfig, DEFAULT_GECKO_TERMINAL_API_URL};
use crate::adapters::pump_fun::{PumpFunConfig, DEFAULT_PUMP_API_URL, DEFAULT_USER_AGENT};
use crate::resilience::RetryPolicy;

/// Main configuration structure matching scraper.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pump: PumpSection,
    pub gecko_terminal: GeckoTerminalSection,
    pub scraper: ScraperSection,
    pub retry: RetryPolicy,
    pub logging: LoggingSection,
}

/// pump.fun frontend API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PumpSection {
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for PumpSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_PUMP_API_URL.to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PumpSection {
    /// Get API URL with environment variable override
    /// Checks PUMP_API_URL env var first, falls back to config value
    pub fn get_api_url(&self) -> String {
        std::env::var("PUMP_API_URL").unwrap_or_else(|_| self.api_url.clone())
    }

    pub fn client_config(&self) -> PumpFunConfig {
        PumpFunConfig {
            api_url: self.get_api_url(),
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// GeckoTerminal API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeckoTerminalSection {
    pub api_url: String,
    /// Network segment of pool URLs
    pub network: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeckoTerminalSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GECKO_TERMINAL_API_URL.to_string(),
            network: "solana".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GeckoTerminalSection {
    /// Get API URL with environment variable override
    /// Checks GECKO_TERMINAL_API_URL env var first, falls back to config value
    pub fn get_api_url(&self) -> String {
        std::env::var("GECKO_TERMINAL_API_URL").unwrap_or_else(|_| self.api_url.clone())
    }

    pub fn client_config(&self) -> GeckoTerminalConfig {
        GeckoTerminalConfig {
            api_url: self.get_api_url(),
            network: self.network.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..Default::default()
        }
    }
}

/// Scrape run section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperSection {
    /// Upper bound on records per listing request
    pub page_size: u64,
    /// Concurrent pool lookups
    pub max_concurrent_lookups: usize,
    /// Attach pool pricing to graduated tokens
    pub enrich_pools: bool,
    /// Whole-run timeout in seconds (0 = none)
    pub run_timeout_secs: u64,
    /// Random pause between pages, `[min, max]` milliseconds
    pub page_stagger_ms: [u64; 2],
    /// Dataset output file; stdout when unset
    pub output: Option<String>,
}

impl Default for ScraperSection {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_concurrent_lookups: 4,
            enrich_pools: true,
            run_timeout_secs: 0,
            page_stagger_ms: [0, 0],
            output: None,
        }
    }
}

impl ScraperSection {
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }

    /// Output path with `~` and env variables expanded
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_deref().map(expand_path)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = expand_path(&path.as_ref().to_string_lossy());
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the file when one is given, otherwise validated defaults
pub fn load_optional_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Expand `~` and `$VAR` in a path, leaving it untouched when expansion fails
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
    }
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pump.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("pump.api_url must not be empty".into()));
        }

        if self.gecko_terminal.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gecko_terminal.api_url must not be empty".into(),
            ));
        }

        if self.gecko_terminal.network.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gecko_terminal.network must not be empty".into(),
            ));
        }

        if self.scraper.page_size == 0 {
            return Err(ConfigError::ValidationError(format!(
                "page_size must be > 0, got {}",
                self.scraper.page_size
            )));
        }

        if self.scraper.max_concurrent_lookups == 0 {
            return Err(ConfigError::ValidationError(format!(
                "max_concurrent_lookups must be > 0, got {}",
                self.scraper.max_concurrent_lookups
            )));
        }

        let [stagger_min, stagger_max] = self.scraper.page_stagger_ms;
        if stagger_min > stagger_max {
            return Err(ConfigError::ValidationError(format!(
                "page_stagger_ms must be [min, max], got [{}, {}]",
                stagger_min, stagger_max
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(format!(
                "retry.max_attempts must be > 0, got {}",
                self.retry.max_attempts
            )));
        }

        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "retry.backoff_multiplier must be >= 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }

        if !matches!(
            self.logging.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace/debug/info/warn/error, got {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}
