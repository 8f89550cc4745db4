//! Runtime configuration.
//!
//! Every setting has a default that reproduces the crawler's fixed behaviour,
//! so running with no config file at all crawls `https://note.lapras.com/`
//! with a 10 second gap between requests and writes `./articles.json`.
//!
//! An optional YAML file can override any subset of the keys:
//!
//! ```yaml
//! start_url: https://note.lapras.com/
//! output_path: ./articles.json
//! min_request_interval_secs: 10
//! request_timeout_secs: 30
//! user_agent: note_crawler/0.1
//! selectors:
//!   article_link: "#main div.post-item h2 > a[href]"
//! ```
//!
//! CLI flags are applied on top of the file (see [`CrawlConfig::apply_cli`]).

use crate::cli::Cli;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_START_URL: &str = "https://note.lapras.com/";
pub const DEFAULT_OUTPUT_PATH: &str = "./articles.json";
pub const DEFAULT_MIN_REQUEST_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid start url {url:?}: {source}")]
    StartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid {name} selector {selector:?}: {message}")]
    Selector {
        name: &'static str,
        selector: String,
        message: String,
    },
}

/// Settings for one crawl run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// First listing page of the pagination chain.
    pub start_url: String,
    /// Destination of the JSON array of articles.
    pub output_path: String,
    /// Pause after every request, in seconds.
    pub min_request_interval_secs: u64,
    /// Per-request timeout of the HTTP client, in seconds.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub selectors: SelectorConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            min_request_interval_secs: DEFAULT_MIN_REQUEST_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// CSS selectors describing the site's page structure.
///
/// `category` is matched as a descendant of `meta` (the two are joined into
/// `"{meta} {category}"`); every other selector is matched against the
/// whole document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub article_link: String,
    pub next_page: String,
    pub title: String,
    pub meta: String,
    pub category: String,
    pub content: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            article_link: "#main div.post-item h2 > a[href]".to_string(),
            next_page: "nav.navigation.pagination a.next.page-numbers[href]".to_string(),
            title: "h1".to_string(),
            meta: "article header div.entry-meta".to_string(),
            category: "a".to_string(),
            content: "article div.entry-content".to_string(),
        }
    }
}

impl CrawlConfig {
    /// Load the config file at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(config_path = path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Override file settings with whatever was passed on the command line.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.start_url {
            self.start_url = url.clone();
        }
        if let Some(output) = &cli.output {
            self.output_path = output.clone();
        }
        if let Some(secs) = cli.interval_secs {
            self.min_request_interval_secs = secs;
        }
        self
    }

    pub fn start_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.start_url).map_err(|source| ConfigError::StartUrl {
            url: self.start_url.clone(),
            source,
        })
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs(self.min_request_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
