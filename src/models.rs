//! Data models for crawled pages and the records written to disk.
//!
//! - [`ListingPageResult`]: what one article-listing page yields
//! - [`ArticleRecord`]: the structured fields of one article page
//!
//! Both are built once by an extractor and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Links found on one article-listing page.
///
/// `article_urls` keeps the order in which the anchors appear in the
/// document. `next_page_link` is `None` exactly when this page is the last
/// one in the pagination chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPageResult {
    /// Raw `href` values of the article anchors, in document order.
    pub article_urls: Vec<String>,
    /// Raw `href` of the "next page" anchor, if the page has one.
    pub next_page_link: Option<String>,
}

impl ListingPageResult {
    /// True when the page contributes nothing to the traversal.
    pub fn is_empty(&self) -> bool {
        self.article_urls.is_empty() && self.next_page_link.is_none()
    }
}

/// One article as extracted from its page.
///
/// This is the shape of every object in the output JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Text of the page's top-level heading.
    pub title: String,
    /// Publish date exactly as displayed, separator glyph removed.
    pub publish_date: String,
    /// Text of the first link in the metadata block.
    pub category: String,
    /// Body text with whitespace between nodes collapsed away.
    pub content: String,
}
