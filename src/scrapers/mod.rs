//! Page extractors for the crawled blog.
//!
//! The crawl works in two phases, and each phase has its own page type:
//!
//! 1. **Listing pages**: [`listing::ListingPageExtractor`] finds the article
//!    links and the "next page" link of one page of the pagination chain.
//! 2. **Article pages**: [`article::ArticlePageExtractor`] turns one article
//!    page into an [`ArticleRecord`](crate::models::ArticleRecord).
//!
//! Extractors are pure: they take markup and return typed data, and never
//! touch the network. Selectors come from [`SelectorConfig`] and are compiled
//! once when the extractor is built.
//!
//! The two extractors treat missing structure differently. A listing page
//! without the expected regions is simply empty. An article page without its
//! heading, metadata or body is an [`article::ExtractError`].

pub mod article;
pub mod listing;

use crate::config::{ConfigError, SelectorConfig};
use scraper::Selector;

pub use article::ArticlePageExtractor;
pub use listing::ListingPageExtractor;

fn compile(name: &'static str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Selector {
        name,
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Build both extractors from one selector set.
pub fn extractors(
    selectors: &SelectorConfig,
) -> Result<(ListingPageExtractor, ArticlePageExtractor), ConfigError> {
    Ok((
        ListingPageExtractor::new(selectors)?,
        ArticlePageExtractor::new(selectors)?,
    ))
}
