use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ScrapedToken;
use crate::resilience::ApiError;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for the output of a run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetSink: Send + Sync {
    /// Append records in order, returning how many were written
    async fn push_records(&self, records: &[ScrapedToken]) -> Result<usize, SinkError>;

    /// Record a failed run
    async fn push_error(&self, error: &ApiError) -> Result<(), SinkError>;
}
