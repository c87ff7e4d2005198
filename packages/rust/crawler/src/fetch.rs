//! Page fetching: a single GET per attempt with an optional retry policy.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use docdistill_shared::{CrawlConfig, DistillError, Result};

/// Anything that can turn a URL into raw markup.
///
/// A non-success status or transport failure is a [`DistillError::Fetch`].
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

/// Outcome of one failed attempt.
enum AttemptError {
    /// Transport failure or 5xx; worth another attempt.
    Transient(String),
    /// 4xx or unreadable body; retrying will not help.
    Permanent(String),
}

/// reqwest-backed fetcher with timeout, rate limit and retry policy.
pub struct HttpFetcher {
    client: Client,
    retries: u32,
    retry_backoff: Duration,
    rate_limit: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from the runtime crawl configuration.
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DistillError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            retries: config.retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            rate_limit: Duration::from_millis(config.rate_limit_ms),
        })
    }

    async fn fetch_once(&self, url: &Url) -> std::result::Result<String, AttemptError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AttemptError::Transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Permanent(format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| AttemptError::Permanent(format!("body read failed: {e}")))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let mut attempt: u32 = 0;

        loop {
            if !self.rate_limit.is_zero() {
                tokio::time::sleep(self.rate_limit).await;
            }

            debug!(%url, attempt, "fetching page");

            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::Transient(cause)) if attempt < self.retries => {
                    attempt += 1;
                    warn!(%url, attempt, retries = self.retries, %cause, "fetch failed, retrying");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(AttemptError::Transient(cause) | AttemptError::Permanent(cause)) => {
                    return Err(DistillError::fetch(url.as_str(), cause));
                }
            }
        }
    }
}
