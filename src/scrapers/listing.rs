//! Article-listing page extractor.
//!
//! With the default selectors, article links are the anchors at
//! `#main div.post-item h2 > a[href]` and the pagination link is
//! `nav.navigation.pagination a.next.page-numbers[href]`.

use crate::config::{ConfigError, SelectorConfig};
use crate::models::ListingPageResult;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::compile;

#[derive(Debug, Clone)]
pub struct ListingPageExtractor {
    article_link: Selector,
    next_page: Selector,
}

impl ListingPageExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            article_link: compile("article_link", &selectors.article_link)?,
            next_page: compile("next_page", &selectors.next_page)?,
        })
    }

    /// Parse one listing page.
    ///
    /// Hrefs are returned exactly as written in the markup. A page without
    /// the expected regions yields an empty result rather than an error.
    pub fn extract(&self, html: &str) -> ListingPageResult {
        let document = Html::parse_document(html);

        let article_urls: Vec<String> = document
            .select(&self.article_link)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();

        let next_page_link = document
            .select(&self.next_page)
            .find_map(|a| a.value().attr("href"))
            .map(str::to_string);

        let result = ListingPageResult {
            article_urls,
            next_page_link,
        };
        if result.is_empty() {
            warn!("Listing page has no article links and no next page link");
        } else {
            debug!(
                count = result.article_urls.len(),
                next = ?result.next_page_link,
                "Parsed listing page"
            );
        }
        result
    }
}
