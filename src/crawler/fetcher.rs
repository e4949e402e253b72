//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `PageFetcher` seam the crawl engine drives
//! - Building HTTP clients with proper user agent strings
//! - Consulting and filling the response cache
//! - Error classification

use crate::config::{Config, UserAgentConfig};
use crate::crawler::cache::ResponseCache;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Page body content
    pub body: String,

    /// Whether the body came from the response cache
    pub from_cache: bool,
}

/// Transport-level failures
///
/// None of these are fatal: the crawl engine logs the failure and drops the URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status_code} for {url}")]
    HttpStatus { url: String, status_code: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Network { url: String, message: String },
}

/// Source of page bodies for the crawl engine
///
/// The production implementation is [`HttpFetcher`]; tests substitute
/// in-memory fetchers.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a single page
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;

    /// Returns true if `fetch` would be served without contacting the origin
    ///
    /// The engine skips the politeness delay for such URLs.
    fn is_cached(&self, _url: &Url) -> bool {
        false
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use living_wage_crawler::config::UserAgentConfig;
/// use living_wage_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "LivingWageCrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP, optionally through a [`ResponseCache`]
pub struct HttpFetcher {
    client: Client,
    cache: Option<ResponseCache>,
}

impl HttpFetcher {
    pub fn new(client: Client, cache: Option<ResponseCache>) -> Self {
        Self { client, cache }
    }

    /// Builds the client and opens the cache described by the configuration
    ///
    /// A cache that cannot be opened is a startup error.
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent, config.crawler.timeout())?;

        let cache = if config.cache.enabled {
            let cache = ResponseCache::open(Path::new(&config.cache.path))?;
            match cache.len() {
                Ok(entries) => tracing::info!(
                    "Response cache: {} ({} entries)",
                    config.cache.path,
                    entries
                ),
                Err(e) => tracing::warn!("Cannot count cache entries: {}", e),
            }
            Some(cache)
        } else {
            tracing::info!("Response cache disabled");
            None
        };

        Ok(Self::new(client, cache))
    }

    async fn fetch_from_network(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
            from_cache: false,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        if let Some(cache) = &self.cache {
            match cache.get(url.as_str()) {
                Ok(Some(cached)) => {
                    tracing::trace!("Cache hit: {}", url);
                    return Ok(FetchedPage {
                        final_url: cached.final_url,
                        status_code: cached.status_code,
                        body: cached.body,
                        from_cache: true,
                    });
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Cache lookup failed for {}: {}", url, e),
            }
        }

        let page = self.fetch_from_network(url).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url.as_str(), &page.final_url, page.status_code, &page.body) {
                tracing::warn!("Failed to cache {}: {}", url, e);
            }
        }

        Ok(page)
    }

    fn is_cached(&self, url: &Url) -> bool {
        self.cache
            .as_ref()
            .map(|cache| cache.contains(url.as_str()).unwrap_or(false))
            .unwrap_or(false)
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert_eq!(
            create_test_config().header_value(),
            "TestCrawler/1.0 (+https://example.com/about)"
        );
    }

    #[test]
    fn test_fetch_error_messages() {
        let err = FetchError::HttpStatus {
            url: "http://livingwage.mit.edu/counties/00000".to_string(),
            status_code: 404,
        };
        assert_eq!(
            err.to_string(),
            "HTTP 404 for http://livingwage.mit.edu/counties/00000"
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let cache = ResponseCache::open_in_memory().unwrap();
        let url = Url::parse("http://127.0.0.1:9/counties/48001").unwrap();
        cache
            .put(url.as_str(), url.as_str(), 200, "<html>cached</html>")
            .unwrap();

        let client = build_http_client(&create_test_config(), Duration::from_secs(1)).unwrap();
        let fetcher = HttpFetcher::new(client, Some(cache));

        assert!(fetcher.is_cached(&url));
        let page = fetcher.fetch(&url).await.unwrap();
        assert!(page.from_cache);
        assert_eq!(page.body, "<html>cached</html>");
    }

    #[test]
    fn test_uncached_fetcher_reports_nothing_cached() {
        let client = build_http_client(&create_test_config(), Duration::from_secs(1)).unwrap();
        let fetcher = HttpFetcher::new(client, None);
        let url = Url::parse("http://livingwage.mit.edu/").unwrap();
        assert!(!fetcher.is_cached(&url));
    }
}
