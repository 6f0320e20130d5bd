//! Politeness-bounded HTTP fetching with retry
//!
//! One [`Fetcher`] wraps a keep-alive reqwest client for the whole run.
//! [`Fetcher::get`] passes through a governor rate limiter (politeness delay
//! plus jitter) before hitting the wire and is what the frontier loop and
//! pagination fetches use; the aggregator's product-detail batches use
//! [`Fetcher::get_unpaced`] and are paced by batch awaits instead. Retriable
//! failures (transport errors, 5xx) back off exponentially with jitter up to
//! the configured retry count; 4xx fails immediately.

use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use rand::Rng;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Base of the exponential retry backoff in milliseconds
const BACKOFF_BASE_MS: u64 = 1_000;

/// Cap on a single retry backoff in milliseconds
const BACKOFF_CAP_MS: u64 = 5_000;

/// Upper bound of the random jitter added to each backoff
const BACKOFF_JITTER_MS: u64 = 300;

/// Timeout tier for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTier {
    /// Category/listing and informational pages: lighter payloads
    Listing,

    /// Product-detail pages: galleries and variant data need more headroom
    Product,
}

/// Rate-limited HTTP fetcher shared by the whole crawl
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    jitter: Duration,
    retries: u32,
    listing_timeout: Duration,
    product_timeout: Duration,
}

impl Fetcher {
    /// Create a fetcher from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");

        let limiter = Quota::with_period(config.delay())
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Self {
            client,
            limiter,
            jitter: config.jitter(),
            retries: config.retries,
            listing_timeout: config.listing_timeout(),
            product_timeout: config.product_timeout(),
        }
    }

    /// Fetch a URL politely, retrying retriable failures with capped backoff
    ///
    /// Awaits the politeness limiter (delay plus jitter) first. A retriable
    /// failure is attempted `retries + 1` times in total before surfacing; a
    /// non-retriable failure surfaces after the first attempt.
    #[instrument(skip(self), level = "debug")]
    pub async fn get(&self, url: &str, tier: FetchTier) -> Result<String, CrawlError> {
        self.wait_politely().await;
        self.get_unpaced(url, tier).await
    }

    /// Fetch a URL without awaiting the politeness limiter
    ///
    /// For bounded concurrent batches whose pacing comes from the batch
    /// structure itself; retry behavior is identical to [`Fetcher::get`].
    #[instrument(skip(self), level = "debug")]
    pub async fn get_unpaced(&self, url: &str, tier: FetchTier) -> Result<String, CrawlError> {
        let timeout = match tier {
            FetchTier::Listing => self.listing_timeout,
            FetchTier::Product => self.product_timeout,
        };

        let mut attempt = 0;
        loop {
            match self.try_get(url, timeout).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retriable() && attempt < self.retries => {
                    let backoff = BACKOFF_BASE_MS
                        .saturating_mul(1 << attempt)
                        .min(BACKOFF_CAP_MS)
                        + rand::thread_rng().gen_range(0..=BACKOFF_JITTER_MS);
                    warn!(
                        "fetch of {} failed ({}), retrying in {}ms",
                        url, err, backoff
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Await the politeness limiter with jitter
    async fn wait_politely(&self) {
        if let Some(limiter) = &self.limiter {
            limiter
                .until_ready_with_jitter(Jitter::up_to(self.jitter))
                .await;
        }
    }

    async fn try_get(&self, url: &str, timeout: Duration) -> Result<String, CrawlError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(CrawlError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(CrawlError::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn fetcher(retries: u32) -> Fetcher {
        let config = CrawlerConfig::builder()
            .delay_ms(0)
            .jitter_ms(0)
            .retries(retries)
            .timeout_ms(2_000)
            .build();
        Fetcher::new(&config)
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rowery/mtb/")
            .with_status(200)
            .with_body("<html>ok</html>")
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/rowery/mtb/", server.url());
        let body = fetcher(2).get(&url, FetchTier::Listing).await.unwrap();
        assert_eq!(body, "<html>ok</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retriable_failure_attempted_retries_plus_one_times() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rowery/mtb/")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let url = format!("{}/rowery/mtb/", server.url());
        let result = fetcher(2).get(&url, FetchTier::Listing).await;

        assert!(matches!(
            result,
            Err(CrawlError::Status { status: 503, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_attempted_exactly_once() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/produkt/missing/")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/produkt/missing/", server.url());
        let result = fetcher(2).get(&url, FetchTier::Product).await;

        assert!(matches!(
            result,
            Err(CrawlError::Status { status: 404, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_failure_is_retried_then_surfaced() {
        // nothing listens on this port; connection errors are retriable
        let config = CrawlerConfig::builder()
            .delay_ms(0)
            .jitter_ms(0)
            .retries(1)
            .timeout_ms(500)
            .build();
        let fetcher = Fetcher::new(&config);

        let result = fetcher
            .get("http://127.0.0.1:9/produkt/x/", FetchTier::Product)
            .await;
        assert!(matches!(result, Err(CrawlError::Network(_))));
    }
}
