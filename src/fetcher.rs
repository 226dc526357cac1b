use crate::types::{RelayConfig, RelayError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Capability for retrieving a remote document as text. The orchestrator only
/// depends on this trait so tests can substitute canned responses.
#[async_trait]
pub trait FetchPage: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with a bounded timeout and a short retry ladder for transient
/// failures. Non-2xx responses after the last attempt surface as `Fetch` errors
/// so the caller can treat them as link-scoped failures.
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(RelayError::Http)?;

        Ok(Self {
            client,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(RelayError::Fetch {
                url: url.to_string(),
                reason: format!(
                    "HTTP {}: {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            });
        }

        let body = response.text().await?;
        Ok(body)
    }
}

#[async_trait]
impl FetchPage for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: self.retry_delay,
            initial_interval: self.retry_delay,
            max_interval: self.retry_delay * 8,
            multiplier: 2.0,
            max_elapsed_time: Some(self.retry_delay * 30),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RelayError::Fetch {
            url: url.to_string(),
            reason: "unknown error".to_string(),
        }))
    }
}
