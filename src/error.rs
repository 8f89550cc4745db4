//! Error types for a crawl run.
//!
//! - [`CrawlError`]: anything that stops the crawl itself (transport,
//!   extraction, unresolvable links)
//! - [`RunError`]: a crawl error or a failure to write the output
//!
//! Every variant is fatal. Nothing here is retried.

use crate::fetch::FetchError;
use crate::outputs::json::OutputError;
use crate::scrapers::article::ExtractError;
use thiserror::Error;

/// Any failure that aborts a crawl. There are no recoverable variants.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error("failed to extract article {url}: {source}")]
    Extraction {
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("cannot resolve link {link:?} against {base}: {source}")]
    InvalidUrl {
        base: String,
        link: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failure of a whole crawl-then-write run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("crawl aborted: {0}")]
    Crawl(#[from] CrawlError),

    #[error("writing output failed: {0}")]
    Output(#[from] OutputError),
}
