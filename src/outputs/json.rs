//! JSON output of the crawled articles.
//!
//! The whole crawl result is written as one array of objects:
//!
//! ```json
//! [{"title": "...", "publish_date": "2020/01/23", "category": "...", "content": "..."}]
//! ```
//!
//! The file is written in one call after the crawl has finished. A failed
//! crawl never reaches this module, so no partial file is left behind.

use crate::models::ArticleRecord;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, instrument};

use super::ArticleSink;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize articles: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the records to a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: String,
}

impl JsonFileSink {
    /// Create a sink for `path`. Nothing is touched until [`ArticleSink::write`].
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file; missing parent directories are created on write
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ArticleSink for JsonFileSink {
    #[instrument(level = "info", skip_all, fields(path = %self.path))]
    async fn write(&self, records: &[ArticleRecord]) -> Result<(), OutputError> {
        let json = serde_json::to_string(records)?;
        let io_err = |source| OutputError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = Path::new(&self.path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent).await {
                    error!(dir = %parent.display(), error = %e, "Failed to create output dir");
                    return Err(io_err(e));
                }
            }
        }

        info!(count = records.len(), "Writing JSON");
        fs::write(&self.path, json).await.map_err(io_err)?;
        info!("Wrote articles JSON file");
        Ok(())
    }
}
