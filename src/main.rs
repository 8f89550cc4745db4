//! # note_crawler
//!
//! Crawls every article of a paginated blog and saves the title, publish
//! date, category and body text of each one to a single JSON file.
//!
//! ## Usage
//!
//! ```sh
//! note_crawler                      # defaults: https://note.lapras.com/ -> ./articles.json
//! note_crawler -c crawler.yaml -o ./data/articles.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing traversal**: follow the "next page" chain from the start URL,
//!    collecting article links
//! 2. **Article extraction**: fetch each link in order and extract its fields
//! 3. **Output**: write all records as one JSON array, only if 1 and 2 succeeded
//!
//! Requests are strictly sequential, with a fixed pause after each one.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod error;
mod fetch;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::CrawlConfig;
use crawler::{Crawler, collect_articles};
use fetch::{HttpFetcher, TokioPause};
use outputs::json::JsonFileSink;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("note_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = CrawlConfig::load(args.config.as_deref())
        .await?
        .apply_cli(&args);
    let start_url = config.start_url()?;
    let (listing, article) = scrapers::extractors(&config.selectors)?;
    info!(
        %start_url,
        output = %config.output_path,
        interval_secs = config.min_request_interval_secs,
        "Configuration ready"
    );

    // Early check: a crawl can take a long time, fail before it starts
    if let Err(e) = ensure_writable_parent(&config.output_path).await {
        error!(
            path = %config.output_path,
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout())?;
    let crawler = Crawler::new(
        fetcher,
        TokioPause,
        listing,
        article,
        config.min_request_interval(),
    );
    let sink = JsonFileSink::new(config.output_path.clone());

    match collect_articles(&crawler, &start_url, &sink).await {
        Ok(count) => {
            let elapsed = start_time.elapsed();
            info!(
                count,
                path = %sink.path(),
                ?elapsed,
                secs = elapsed.as_secs(),
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Crawl failed; no output written");
            Err(e.into())
        }
    }
}
