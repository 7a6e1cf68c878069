use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy};
use url::Url;

use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;

// Rotating User-Agent pool - mimics different browsers for better compatibility
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// Feed fetcher with a retrying HTTP client
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::build_client(config.sync.request_timeout_secs, &config.sync.proxy_url)?;

        Ok(Self { client })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy =
                Proxy::all(proxy).map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    /// Build browser-like headers for a request
    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.7",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    /// Fetch with retry and exponential backoff
    async fn fetch_with_retry(&self, url: &str) -> Result<Bytes> {
        let mut last_error = None;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        for attempt in 0..MAX_RETRIES {
            let user_agent = next_user_agent();
            let headers = Self::build_headers(user_agent);

            tracing::debug!(
                "Fetch attempt {} for {}, User-Agent: {}",
                attempt + 1,
                url,
                user_agent
            );

            match self.client.get(url).headers(headers).send().await {
                Ok(response) => {
                    let status = response.status();

                    // Retry on rate limiting and transient unavailability
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
                    {
                        tracing::warn!(
                            "Received {} for {}, retrying after {}ms...",
                            status,
                            url,
                            delay_ms
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms *= 2;
                        last_error =
                            Some(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(Error::FeedParse(format!(
                            "HTTP {} for URL: {}",
                            status, url
                        )));
                    }

                    match response.bytes().await {
                        Ok(bytes) => {
                            if bytes.len() > MAX_FEED_BYTES {
                                return Err(Error::FeedParse(format!(
                                    "Feed too large ({} bytes) for URL: {}",
                                    bytes.len(),
                                    url
                                )));
                            }
                            return Ok(bytes);
                        }
                        Err(e) => {
                            tracing::warn!("Failed to read response body: {}", e);
                            last_error = Some(Error::Http(e));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Request failed for {} (attempt {}): {}", url, attempt + 1, e);
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt < MAX_RETRIES - 1 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::FeedParse(format!(
                "Failed to fetch URL after {} retries: {}",
                MAX_RETRIES, url
            ))
        }))
    }

    /// Fetch a feed URL as raw bytes
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        // Validate before issuing the request
        Url::parse(url)?;

        tracing::info!("Fetching feed from: {}", url);

        self.fetch_with_retry(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected_before_request() {
        let config = AppConfig::default();
        let fetcher = FeedFetcher::new(&config).unwrap();

        let err = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(fetcher.fetch("not a url"))
            .unwrap_err();
        assert!(matches!(err, Error::UrlParse(_)));
    }

    #[test]
    fn test_user_agent_rotation() {
        USER_AGENT_INDEX.store(0, Ordering::Relaxed);

        let ua1 = next_user_agent();
        let ua2 = next_user_agent();
        let ua3 = next_user_agent();

        assert!(ua1.contains("Chrome") && ua1.contains("Macintosh"));
        assert!(ua2.contains("Chrome") && ua2.contains("Windows"));
        assert!(ua3.contains("Firefox"));
    }
}
