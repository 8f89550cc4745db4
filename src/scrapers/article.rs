//! Article page extractor.
//!
//! An article page is expected to carry one `h1`, a metadata block
//! (`article header div.entry-meta`) that opens with the publish date as a
//! bare text node followed by a category link, and a body block
//! (`article div.entry-content`):
//!
//! ```html
//! <h1>Title</h1>
//! <article>
//!   <header><div class="entry-meta">2020/01/23｜<a href="/category/tech/">Tech</a></div></header>
//!   <div class="entry-content"><p>Body</p></div>
//! </article>
//! ```
//!
//! Any of those missing is an [`ExtractError`]. There is no fallback.

use crate::config::{ConfigError, SelectorConfig};
use crate::models::ArticleRecord;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::compile;

/// Separator printed between the date and the category link.
const DATE_SEPARATOR: char = '｜';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("required element missing from article page: {element}")]
    MissingElement { element: &'static str },
}

#[derive(Debug, Clone)]
pub struct ArticlePageExtractor {
    title: Selector,
    meta: Selector,
    /// `category` nested under any `meta` element, matched document-wide.
    meta_category: Selector,
    content: Selector,
}

impl ArticlePageExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile("title", &selectors.title)?,
            meta: compile("meta", &selectors.meta)?,
            meta_category: compile(
                "category",
                &format!("{} {}", selectors.meta, selectors.category),
            )?,
            content: compile("content", &selectors.content)?,
        })
    }

    /// Extract the record of one article page.
    ///
    /// The publish date comes from the first metadata block. The category is
    /// the first link inside any metadata block, so a page whose first block
    /// carries only the date still yields the category of a later one.
    ///
    /// # Arguments
    ///
    /// * `html` - Raw markup of the article page
    ///
    /// # Returns
    ///
    /// The [`ArticleRecord`], or [`ExtractError::MissingElement`] naming the
    /// first required element that is absent.
    pub fn extract(&self, html: &str) -> Result<ArticleRecord, ExtractError> {
        let document = Html::parse_document(html);

        let title = first(&document, &self.title, "title")?;
        let meta = first(&document, &self.meta, "metadata block")?;
        let content = first(&document, &self.content, "content block")?;

        let publish_date = meta
            .children()
            .find_map(|node| node.value().as_text())
            .map(|text| text.replace(DATE_SEPARATOR, ""))
            .ok_or(ExtractError::MissingElement {
                element: "publish date",
            })?;

        let category = first(&document, &self.meta_category, "category")?;

        Ok(ArticleRecord {
            title: title.text().collect(),
            publish_date,
            category: category.text().collect(),
            content: stripped_text(content),
        })
    }
}

fn first<'a>(
    document: &'a Html,
    selector: &Selector,
    element: &'static str,
) -> Result<ElementRef<'a>, ExtractError> {
    document
        .select(selector)
        .next()
        .ok_or(ExtractError::MissingElement { element })
}

/// All descendant text, each node trimmed, empty nodes dropped, no separator.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .join("")
}
