//! Crawl orchestration.
//!
//! A crawl runs in two sequential phases:
//!
//! 1. **Listing traversal**: fetch the start page, collect its article links,
//!    follow its "next page" link, and repeat until a page has none.
//! 2. **Article extraction**: fetch every collected link in discovery order
//!    and extract an [`ArticleRecord`] from each.
//!
//! Exactly one request is in flight at a time, and every request is followed
//! by a pause of `min_request_interval`, whether it succeeded or not. Any
//! transport or extraction failure aborts the whole crawl.

use crate::error::{CrawlError, RunError};
use crate::fetch::{Fetch, FetchedPage, Pause};
use crate::models::ArticleRecord;
use crate::outputs::ArticleSink;
use crate::scrapers::{ArticlePageExtractor, ListingPageExtractor};
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub struct Crawler<F, P> {
    fetcher: F,
    pause: P,
    listing: ListingPageExtractor,
    article: ArticlePageExtractor,
    min_request_interval: Duration,
}

impl<F, P> Crawler<F, P>
where
    F: Fetch,
    P: Pause,
{
    /// Assemble a crawler from its capabilities and extractors.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Downloads listing and article pages
    /// * `pause` - Waits out `min_request_interval` after every request
    /// * `listing` - Parses listing pages
    /// * `article` - Parses article pages
    /// * `min_request_interval` - Minimum spacing between consecutive requests
    pub fn new(
        fetcher: F,
        pause: P,
        listing: ListingPageExtractor,
        article: ArticlePageExtractor,
        min_request_interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            pause,
            listing,
            article,
            min_request_interval,
        }
    }

    /// Crawl every article reachable from `start_url`.
    ///
    /// Records come back in discovery order: listing order within a page,
    /// then page-chain order.
    #[instrument(level = "info", skip_all, fields(start_url = %start_url))]
    pub async fn run(&self, start_url: &Url) -> Result<Vec<ArticleRecord>, CrawlError> {
        let article_urls = self.collect_article_urls(start_url).await?;
        info!(count = article_urls.len(), "Collected article URLs");

        let total = article_urls.len();
        let records: Vec<ArticleRecord> = stream::iter(article_urls.into_iter().enumerate())
            .then(|(index, url)| async move {
                debug!(index, total, "Crawling article");
                self.crawl_article_page(&url).await
            })
            .try_collect()
            .await?;

        info!(count = records.len(), "Extracted articles");
        Ok(records)
    }

    /// Phase 1: walk the pagination chain and gather article links.
    #[instrument(level = "info", skip_all)]
    pub async fn collect_article_urls(&self, start_url: &Url) -> Result<Vec<String>, CrawlError> {
        let mut article_urls = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start_url.clone();

        loop {
            visited.insert(current.clone());
            info!(url = %current, "Fetching listing page");
            let fetched = self.fetch_paced(current.as_str()).await?;
            let page = self.listing.extract(&fetched.body);

            // Links resolve against where the page was served from.
            let base = match Url::parse(&fetched.url) {
                Ok(served) if served != current => {
                    debug!(requested = %current, served = %served, "Listing page was redirected");
                    visited.insert(served.clone());
                    served
                }
                _ => current.clone(),
            };

            for link in &page.article_urls {
                article_urls.push(resolve(&base, link)?.to_string());
            }
            info!(
                url = %current,
                found = page.article_urls.len(),
                total = article_urls.len(),
                "Parsed listing page"
            );

            let Some(next) = page.next_page_link else {
                break;
            };
            let next = resolve(&base, &next)?;
            if visited.contains(&next) {
                warn!(url = %next, "Next page link points to an already visited page; stopping");
                break;
            }
            current = next;
        }

        Ok(article_urls)
    }

    /// Phase 2, one step: fetch and extract a single article.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl_article_page(&self, url: &str) -> Result<ArticleRecord, CrawlError> {
        info!("Fetching article page");
        let body = self.fetch_paced(url).await?.body;
        match self.article.extract(&body) {
            Ok(record) => {
                debug!(title = %record.title, "Extracted article");
                Ok(record)
            }
            Err(source) => {
                error!(
                    error = %source,
                    body_preview = %truncate_for_log(&body, 300),
                    "Article page does not match the expected structure"
                );
                Err(CrawlError::Extraction {
                    url: url.to_string(),
                    source,
                })
            }
        }
    }

    /// Fetch, then wait out the request interval before reporting the outcome.
    async fn fetch_paced(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        let result = self.fetcher.fetch(url).await;
        self.pause.pause(self.min_request_interval).await;
        result.map_err(|e| {
            error!(url = e.url(), error = %e, "Fetch failed; aborting crawl");
            CrawlError::from(e)
        })
    }
}

fn resolve(base: &Url, link: &str) -> Result<Url, CrawlError> {
    base.join(link).map_err(|source| CrawlError::InvalidUrl {
        base: base.to_string(),
        link: link.to_string(),
        source,
    })
}

/// Crawl everything, then hand the complete result to `sink` once.
///
/// Returns the number of records written. When the crawl fails the sink is
/// never called.
#[instrument(level = "info", skip_all, fields(start_url = %start_url))]
pub async fn collect_articles<F, P, S>(
    crawler: &Crawler<F, P>,
    start_url: &Url,
    sink: &S,
) -> Result<usize, RunError>
where
    F: Fetch,
    P: Pause,
    S: ArticleSink,
{
    let t0 = Instant::now();
    info!("Start crawl");
    let records = crawler.run(start_url).await?;
    info!(
        count = records.len(),
        elapsed_secs = t0.elapsed().as_secs(),
        "Crawl finished; writing output"
    );

    sink.write(&records).await?;
    info!(count = records.len(), "Done output");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use crate::fetch::FetchError;
    use crate::outputs::json::OutputError;
    use crate::scrapers::article::ExtractError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const INTERVAL: Duration = Duration::from_secs(10);

    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        failing: HashMap<String, u16>,
        redirects: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn page(mut self, url: &str, body: String) -> Self {
            self.pages.insert(url.to_string(), body);
            self
        }

        fn failing(mut self, url: &str, status: u16) -> Self {
            self.failing.insert(url.to_string(), status);
            self
        }

        fn redirect(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), to.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Fetch for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            let served = self.redirects.get(url).map(String::as_str).unwrap_or(url);
            if let Some(status) = self.failing.get(url) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                });
            }
            match self.pages.get(served) {
                Some(body) => Ok(FetchedPage {
                    url: served.to_string(),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingPause {
        pauses: RefCell<Vec<Duration>>,
    }

    impl Pause for RecordingPause {
        async fn pause(&self, duration: Duration) {
            self.pauses.borrow_mut().push(duration);
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: RefCell<Vec<Vec<ArticleRecord>>>,
    }

    impl ArticleSink for RecordingSink {
        async fn write(&self, records: &[ArticleRecord]) -> Result<(), OutputError> {
            self.writes.borrow_mut().push(records.to_vec());
            Ok(())
        }
    }

    fn listing(links: &[&str], next: Option<&str>) -> String {
        let posts: String = links
            .iter()
            .map(|href| format!(r#"<div class="post-item"><h2><a href="{href}">t</a></h2></div>"#))
            .collect();
        let next = next
            .map(|href| format!(r#"<a class="next page-numbers" href="{href}">次へ</a>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body><div id="main">{posts}</div><nav class="navigation pagination">{next}</nav></body></html>"#
        )
    }

    fn article(n: &str) -> String {
        format!(
            r#"<html><body><h1>Title {n}</h1><article><header>
            <div class="entry-meta">2020/01/{n}｜<a href="/category/c{n}/">Category {n}</a></div>
            </header><div class="entry-content"><p>Body</p> <p>{n}</p></div></article></body></html>"#
        )
    }

    fn expected(n: &str) -> ArticleRecord {
        ArticleRecord {
            title: format!("Title {n}"),
            publish_date: format!("2020/01/{n}"),
            category: format!("Category {n}"),
            content: format!("Body{n}"),
        }
    }

    fn crawler<F: Fetch>(fetcher: F) -> Crawler<F, RecordingPause> {
        let selectors = SelectorConfig::default();
        Crawler::new(
            fetcher,
            RecordingPause::default(),
            ListingPageExtractor::new(&selectors).unwrap(),
            ArticlePageExtractor::new(&selectors).unwrap(),
            INTERVAL,
        )
    }

    fn start() -> Url {
        Url::parse("https://blog.test/").unwrap()
    }

    fn two_page_site() -> FakeFetcher {
        FakeFetcher::default()
            .page(
                "https://blog.test/",
                listing(
                    &["https://blog.test/a1/", "https://blog.test/a2/"],
                    Some("https://blog.test/page/2/"),
                ),
            )
            .page(
                "https://blog.test/page/2/",
                listing(&["https://blog.test/b1/"], None),
            )
            .page("https://blog.test/a1/", article("01"))
            .page("https://blog.test/a2/", article("02"))
            .page("https://blog.test/b1/", article("03"))
    }

    #[tokio::test]
    async fn test_two_page_chain_in_discovery_order() {
        let crawler = crawler(two_page_site());

        let records = crawler.run(&start()).await.unwrap();

        assert_eq!(records, vec![expected("01"), expected("02"), expected("03")]);
        assert_eq!(
            crawler.fetcher.calls(),
            vec![
                "https://blog.test/",
                "https://blog.test/page/2/",
                "https://blog.test/a1/",
                "https://blog.test/a2/",
                "https://blog.test/b1/",
            ]
        );
    }

    #[tokio::test]
    async fn test_pause_after_every_request() {
        let crawler = crawler(two_page_site());

        crawler.run(&start()).await.unwrap();

        assert_eq!(*crawler.pause.pauses.borrow(), vec![INTERVAL; 5]);
    }

    #[tokio::test]
    async fn test_single_page_without_next_link_stops() {
        let fetcher = FakeFetcher::default()
            .page("https://blog.test/", listing(&["/only/"], None))
            .page("https://blog.test/only/", article("09"));
        let crawler = crawler(fetcher);

        let records = crawler.run(&start()).await.unwrap();

        assert_eq!(records, vec![expected("09")]);
        assert_eq!(crawler.fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_listing_page_still_follows_next_link() {
        let fetcher = FakeFetcher::default()
            .page("https://blog.test/", listing(&[], Some("/page/2/")))
            .page("https://blog.test/page/2/", listing(&["/x/"], None));
        let crawler = crawler(fetcher);

        let urls = crawler.collect_article_urls(&start()).await.unwrap();

        assert_eq!(urls, vec!["https://blog.test/x/"]);
    }

    #[tokio::test]
    async fn test_relative_links_resolve_against_listing_page() {
        let fetcher = FakeFetcher::default()
            .page(
                "https://blog.test/",
                listing(&["/2020/01/a/", "b/"], Some("page/2/")),
            )
            .page(
                "https://blog.test/page/2/",
                listing(&["../c/", "https://other.test/d/"], None),
            );
        let crawler = crawler(fetcher);

        let urls = crawler.collect_article_urls(&start()).await.unwrap();

        assert_eq!(
            urls,
            vec![
                "https://blog.test/2020/01/a/",
                "https://blog.test/b/",
                "https://blog.test/page/c/",
                "https://other.test/d/",
            ]
        );
    }

    #[tokio::test]
    async fn test_unresolvable_article_link_aborts_before_articles() {
        let fetcher = FakeFetcher::default()
            .page("https://blog.test/", listing(&["/ok/", "http://[::1"], None))
            .page("https://blog.test/ok/", article("01"));
        let crawler = crawler(fetcher);

        let err = crawler.run(&start()).await.unwrap_err();

        match err {
            CrawlError::InvalidUrl { base, link, .. } => {
                assert_eq!(base, "https://blog.test/");
                assert_eq!(link, "http://[::1");
            }
            other => panic!("expected invalid url error, got {other:?}"),
        }
        assert_eq!(crawler.fetcher.calls(), vec!["https://blog.test/"]);
        assert_eq!(crawler.pause.pauses.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_links_resolve_against_redirected_listing_url() {
        let fetcher = FakeFetcher::default()
            .page("https://blog.test/", listing(&["a/"], Some("/page/2")))
            .redirect("https://blog.test/page/2", "https://blog.test/page/2/")
            .page(
                "https://blog.test/page/2/",
                listing(&["b/"], Some("/page/2/")),
            );
        let crawler = crawler(fetcher);

        let urls = crawler.collect_article_urls(&start()).await.unwrap();

        assert_eq!(
            urls,
            vec!["https://blog.test/a/", "https://blog.test/page/2/b/"]
        );
        // The served URL counts as visited, so its self-link ends traversal.
        assert_eq!(
            crawler.fetcher.calls(),
            vec!["https://blog.test/", "https://blog.test/page/2"]
        );
    }

    #[tokio::test]
    async fn test_pagination_cycle_stops() {
        let fetcher = FakeFetcher::default()
            .page("https://blog.test/", listing(&["/a/"], Some("/page/2/")))
            .page("https://blog.test/page/2/", listing(&["/b/"], Some("/")));
        let crawler = crawler(fetcher);

        let urls = crawler.collect_article_urls(&start()).await.unwrap();

        assert_eq!(urls, vec!["https://blog.test/a/", "https://blog.test/b/"]);
        assert_eq!(crawler.fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_transport_error_is_fatal() {
        let fetcher = FakeFetcher::default()
            .page("https://blog.test/", listing(&["/a/"], Some("/page/2/")))
            .failing("https://blog.test/page/2/", 500);
        let crawler = crawler(fetcher);

        let err = crawler.run(&start()).await.unwrap_err();

        assert!(matches!(
            err,
            CrawlError::Transport(FetchError::Status { status: 500, .. })
        ));
        // No article is fetched once traversal fails, but the failed request
        // still waits out the interval.
        assert_eq!(crawler.fetcher.calls().len(), 2);
        assert_eq!(crawler.pause.pauses.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_second_article_failure_aborts_without_writing() {
        let fetcher = two_page_site().failing("https://blog.test/a2/", 503);
        let crawler = crawler(fetcher);
        let sink = RecordingSink::default();

        let err = collect_articles(&crawler, &start(), &sink)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Crawl(CrawlError::Transport(FetchError::Status { status: 503, .. }))
        ));
        assert!(sink.writes.borrow().is_empty());
        assert_eq!(
            crawler.fetcher.calls().last().map(String::as_str),
            Some("https://blog.test/a2/")
        );
        assert!(!crawler.fetcher.calls().contains(&"https://blog.test/b1/".to_string()));
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts() {
        let fetcher = two_page_site().page("https://blog.test/a1/", "<html>moved</html>".to_string());
        let crawler = crawler(fetcher);

        let err = crawler.run(&start()).await.unwrap_err();

        match err {
            CrawlError::Extraction { url, source } => {
                assert_eq!(url, "https://blog.test/a1/");
                assert_eq!(source, ExtractError::MissingElement { element: "title" });
            }
            other => panic!("expected extraction error, got {other:?}"),
        }
        assert_eq!(crawler.fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_collect_articles_writes_once() {
        let crawler = crawler(two_page_site());
        let sink = RecordingSink::default();

        let written = collect_articles(&crawler, &start(), &sink).await.unwrap();

        assert_eq!(written, 3);
        let writes = sink.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], vec![expected("01"), expected("02"), expected("03")]);
    }

    #[tokio::test]
    async fn test_collect_articles_round_trips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        let sink = crate::outputs::json::JsonFileSink::new(path.to_str().unwrap());
        let crawler = crawler(two_page_site());

        collect_articles(&crawler, &start(), &sink).await.unwrap();

        let parsed: Vec<ArticleRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![expected("01"), expected("02"), expected("03")]);
    }
}
