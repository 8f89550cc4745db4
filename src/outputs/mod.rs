//! Output of the crawl result.
//!
//! - [`json`]: writes the records as one JSON array to a file
//!
//! The crawler hands its result to an [`ArticleSink`] exactly once, after
//! every page has been fetched and extracted.

pub mod json;

use crate::models::ArticleRecord;
use json::OutputError;

/// Destination for the complete, ordered crawl result.
pub trait ArticleSink {
    async fn write(&self, records: &[ArticleRecord]) -> Result<(), OutputError>;
}
