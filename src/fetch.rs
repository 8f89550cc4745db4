//! Outbound I/O capabilities used by the crawler.
//!
//! - [`Fetch`]: download one page and return its body text along with the
//!   URL it was finally served from
//! - [`Pause`]: wait out the politeness interval between requests
//!
//! Production code uses [`HttpFetcher`] and [`TokioPause`]. Tests substitute
//! in-memory fakes so a whole crawl runs without network or wall-clock delay.

use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. } | FetchError::Status { url, .. } => url,
        }
    }
}

/// A downloaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL the body was served from, after redirects. Relative links in the
    /// body resolve against this, not against the requested URL.
    pub url: String,
    pub body: String,
}

/// Download a page.
///
/// Any non-success status and any connection failure is a [`FetchError`].
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Suspend the crawl for a fixed interval.
pub trait Pause {
    async fn pause(&self, duration: Duration);
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with its own connection pool.
    ///
    /// Redirects are followed with `reqwest`'s default policy.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value of the `User-Agent` header sent with every request
    /// * `timeout` - Total time allowed for one request, body included
    ///
    /// # Returns
    ///
    /// The fetcher, or the `reqwest` error if the TLS backend cannot be set up.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let t0 = Instant::now();
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Non-success response");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(network)?;
        debug!(
            %url,
            %final_url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}

/// [`Pause`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
