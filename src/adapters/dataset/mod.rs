//! Dataset Adapter
//!
//! JSON-lines dataset: one flat JSON object per scraped token, or a single
//! error object when the run failed. Writes to stdout or appends to a file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::domain::ScrapedToken;
use crate::ports::{DatasetSink, SinkError};
use crate::resilience::ApiError;

/// Where dataset lines go
#[derive(Debug, Clone, PartialEq)]
pub enum SinkTarget {
    Stdout,
    File(PathBuf),
}

/// JSON-lines dataset sink
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    target: SinkTarget,
}

impl JsonLinesSink {
    pub fn stdout() -> Self {
        Self {
            target: SinkTarget::Stdout,
        }
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            target: SinkTarget::File(path.as_ref().to_path_buf()),
        }
    }

    /// `None` or `-` means stdout
    pub fn from_output(output: Option<&Path>) -> Self {
        match output {
            Some(path) if path != Path::new("-") => Self::file(path),
            _ => Self::stdout(),
        }
    }

    pub fn target(&self) -> &SinkTarget {
        &self.target
    }

    async fn write_lines<T: Serialize>(&self, items: &[T]) -> Result<(), SinkError> {
        let mut buffer = Vec::new();
        for item in items {
            serde_json::to_writer(&mut buffer, item)?;
            buffer.push(b'\n');
        }

        match &self.target {
            SinkTarget::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&buffer).await?;
                stdout.flush().await?;
            }
            SinkTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(&buffer).await?;
                file.flush().await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl DatasetSink for JsonLinesSink {
    async fn push_records(&self, records: &[ScrapedToken]) -> Result<usize, SinkError> {
        self.write_lines(records).await?;
        tracing::info!("Pushed {} records to {:?}", records.len(), self.target);
        Ok(records.len())
    }

    async fn push_error(&self, error: &ApiError) -> Result<(), SinkError> {
        self.write_lines(std::slice::from_ref(error)).await
    }
}
