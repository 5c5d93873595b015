//! Error Values
//!
//! `ApiError` is the serializable form a failed run is reported as. Error
//! types that can reach the run boundary describe themselves through
//! `ErrorContext`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error code used when a failure carries no code of its own
pub const UNKNOWN_ERROR_CODE: &str = "Unknown";

/// Error code for panics caught at the run boundary
pub const PANIC_ERROR_CODE: &str = "PANIC";

/// Classification hooks for errors that end up as an `ApiError`
pub trait ErrorContext: fmt::Display {
    fn error_code(&self) -> String {
        UNKNOWN_ERROR_CODE.to_string()
    }

    /// Upstream URL involved in the failure, if any
    fn source_url(&self) -> Option<String> {
        None
    }
}

/// Serializable error record pushed to the dataset in place of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error_code: String,
    pub message: String,
    pub url: Option<String>,
}

impl ApiError {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn from_error<E: ErrorContext + ?Sized>(error: &E) -> Self {
        Self {
            error_code: error.error_code(),
            message: error.to_string(),
            url: error.source_url(),
        }
    }

    /// Build from a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string());
        Self::new(PANIC_ERROR_CODE, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code, self.message)?;
        if let Some(url) = &self.url {
            write!(f, " ({})", url)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ErrorContext for ApiError {
    fn error_code(&self) -> String {
        self.error_code.clone()
    }

    fn source_url(&self) -> Option<String> {
        self.url.clone()
    }
}
