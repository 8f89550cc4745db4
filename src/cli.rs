//! Command-line interface definitions for the crawler.
//!
//! Every flag is optional. Without any, the crawler runs with the defaults
//! from [`crate::config`].

use clap::Parser;

/// Command-line arguments for note_crawler.
///
/// # Examples
///
/// ```sh
/// # Crawl with defaults, writing ./articles.json
/// note_crawler
///
/// # Use a config file and a different destination
/// note_crawler -c crawler.yaml -o ./data/articles.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NOTE_CRAWLER_CONFIG")]
    pub config: Option<String>,

    /// Where to write the JSON array of articles
    #[arg(short, long)]
    pub output: Option<String>,

    /// First listing page to crawl
    #[arg(long)]
    pub start_url: Option<String>,

    /// Seconds to wait after every request
    #[arg(long)]
    pub interval_secs: Option<u64>,
}
