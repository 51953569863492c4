//! HTTP fetching of listing pages.
//!
//! Transient failures (connect errors, timeouts, 5xx) are retried a bounded
//! number of times with a doubling delay. Permanent failures (4xx, empty
//! body) abort immediately. Either way a failed fetch aborts the run before
//! the published feed is touched.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Browser-like User-Agent, as the site serves bot UAs differently.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Empty response body from {0}")]
    EmptyBody(String),
}

impl FetchError {
    /// Whether retrying could plausibly help.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => status.is_server_error(),
            FetchError::Network(e) => e.is_timeout() || e.is_connect(),
            FetchError::EmptyBody(_) => false,
        }
    }
}

pub struct Fetcher {
    client: reqwest::Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_policy(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }

    pub fn with_policy(max_attempts: u32, retry_delay: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Fetcher {
            client,
            max_attempts,
            retry_delay,
        })
    }

    /// Fetch raw HTML, retrying transient failures.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut delay = self.retry_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.try_fetch(url).await {
                Ok(body) => {
                    debug!(url, bytes = body.len(), "fetched listing page");
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(url, attempt, error = %e, "transient fetch failure, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }

        Ok(body)
    }
}
