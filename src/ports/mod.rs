//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The pump.fun token listing (paginated)
//! - Pool pricing lookups (GeckoTerminal)
//! - The dataset the run results are pushed to

pub mod listing;
pub mod mocks;
pub mod pricing;
pub mod sink;

use thiserror::Error;

use crate::resilience::ErrorContext;

pub use listing::TokenListingPort;
pub use pricing::PoolPricingPort;
pub use sink::{DatasetSink, SinkError};

/// Failure of a request to an upstream HTTP API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl UpstreamError {
    pub fn status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        UpstreamError::Status {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        UpstreamError::Malformed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Transport failures, rate limiting, server errors and bad payloads are
    /// worth another attempt. Other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Transport(_) => true,
            UpstreamError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            UpstreamError::Malformed { .. } => true,
        }
    }
}

impl ErrorContext for UpstreamError {
    fn error_code(&self) -> String {
        match self {
            UpstreamError::Transport(e) if e.is_timeout() => "TIMEOUT".to_string(),
            UpstreamError::Transport(_) => "TRANSPORT".to_string(),
            UpstreamError::Status { status, .. } => format!("HTTP_{}", status),
            UpstreamError::Malformed { .. } => "MALFORMED_RESPONSE".to_string(),
        }
    }

    fn source_url(&self) -> Option<String> {
        match self {
            UpstreamError::Transport(e) => e.url().map(|u| u.to_string()),
            UpstreamError::Status { url, .. } | UpstreamError::Malformed { url, .. } => {
                Some(url.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(UpstreamError::status(status, "u", "").is_retryable(), "{}", status);
        }
        for status in [400, 401, 403, 404, 422] {
            assert!(!UpstreamError::status(status, "u", "").is_retryable(), "{}", status);
        }
        assert!(UpstreamError::malformed("u", "bad json").is_retryable());
    }

    #[test]
    fn test_error_context() {
        let err = UpstreamError::status(404, "https://frontend-api.pump.fun/coins", "not found");
        assert_eq!(err.error_code(), "HTTP_404");
        assert_eq!(
            err.source_url().as_deref(),
            Some("https://frontend-api.pump.fun/coins")
        );

        let err = UpstreamError::malformed("https://x", "eof");
        assert_eq!(err.error_code(), "MALFORMED_RESPONSE");
    }
}
