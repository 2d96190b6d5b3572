//! HTTP client for product page fetching
//!
//! `DocumentFetcher` is the seam between the scraper and the network. The
//! reqwest-backed `HttpClient` follows redirects itself so the per-request
//! limit is enforced exactly, and can share a governor rate limiter across
//! every request it makes.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, LOCATION, USER_AGENT},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::parsing_error::TransportError;

/// One raw-document request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Hosts a redirect may land on, subdomains included; empty allows any
    pub allowed_domains: Vec<String>,
}

impl FetchRequest {
    /// Whether a redirect hop to `url` stays inside `allowed_domains`
    pub fn allows(&self, url: &Url) -> bool {
        self.allowed_domains.is_empty() || host_allowed(url, &self.allowed_domains)
    }
}

/// Host of `url` equals one of `domains` or is a subdomain of one
pub fn host_allowed(url: &Url, domains: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    domains.iter().any(|domain| {
        let domain = domain.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}

/// Response as seen after redirects; non-2xx statuses are returned, not raised
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub status: u16,
    pub final_url: Url,
    pub body: String,
}

impl RawDocument {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw-document fetch collaborator
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, TransportError>;
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Fallback user agent when a request carries none
    pub user_agent: String,
    /// Global request budget; `None` leaves pacing to the caller
    pub max_requests_per_second: Option<u32>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::infrastructure::config::defaults::USER_AGENT.to_string(),
            max_requests_per_second: None,
        }
    }
}

impl HttpClientConfig {
    pub fn from_scraper_config(config: &crate::infrastructure::config::ScraperConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_requests_per_second: config.max_requests_per_second,
        }
    }
}

/// reqwest-backed `DocumentFetcher`
pub struct HttpClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        let client = Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .brotli(true)
            .build()?;

        let rate_limiter = match config.max_requests_per_second {
            Some(rps) => {
                let rps = NonZeroU32::new(rps)
                    .ok_or_else(|| anyhow::anyhow!("Rate limit must be greater than 0"))?;
                Some(RateLimiter::direct(Quota::per_second(rps)))
            }
            None => None,
        };

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl DocumentFetcher for HttpClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, TransportError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        info!("Fetching URL: {}", request.url);

        let mut url = request.url.clone();
        let mut redirects = 0;
        loop {
            let response = self
                .client
                .get(url.clone())
                .headers(request.headers.clone())
                .timeout(request.timeout)
                .send()
                .await
                .map_err(|e| classify(&e, request.timeout))?;

            let status = response.status();
            if status.is_redirection() {
                if let Some(location) = response.headers().get(LOCATION) {
                    if redirects >= request.max_redirects {
                        return Err(TransportError::TooManyRedirects {
                            limit: request.max_redirects,
                        });
                    }
                    let location = location
                        .to_str()
                        .map_err(|e| TransportError::InvalidRedirect(e.to_string()))?;
                    let next = url
                        .join(location)
                        .map_err(|e| TransportError::InvalidRedirect(format!("{location}: {e}")))?;
                    if !request.allows(&next) {
                        return Err(TransportError::RedirectNotAllowed(next.to_string()));
                    }
                    debug!("Redirect {} -> {} ({})", url, next, status);
                    url = next;
                    redirects += 1;
                    continue;
                }
            }

            let body = response
                .text()
                .await
                .map_err(|e| classify(&e, request.timeout))?;

            debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
            return Ok(RawDocument {
                status: status.as_u16(),
                final_url: url,
                body,
            });
        }
    }
}

fn classify(error: &reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        assert!(client.rate_limiter.is_none());
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_second: Some(0),
            ..Default::default()
        };
        assert!(HttpClient::new(config).is_err());
    }

    #[test]
    fn test_raw_document_success_range() {
        let url = Url::parse("https://www.aliexpress.us/").unwrap();
        let doc = |status| RawDocument {
            status,
            final_url: url.clone(),
            body: String::new(),
        };
        assert!(doc(200).is_success());
        assert!(!doc(302).is_success());
        assert!(!doc(503).is_success());
    }

    #[test]
    fn test_redirect_hops_respect_allowed_domains() {
        let request = FetchRequest {
            url: Url::parse("https://www.aliexpress.us/item/1.html").unwrap(),
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(1),
            max_redirects: 5,
            allowed_domains: vec!["aliexpress.us".to_string()],
        };
        let hop = |address: &str| request.allows(&Url::parse(address).unwrap());

        assert!(hop("https://aliexpress.us/item/1.html"));
        assert!(hop("https://m.AliExpress.us/item/1.html"));
        assert!(!hop("https://aliexpress.us.evil.example/item/1.html"));
        assert!(!hop("https://notaliexpress.us/item/1.html"));

        let open = FetchRequest {
            allowed_domains: Vec::new(),
            ..request.clone()
        };
        assert!(open.allows(&Url::parse("https://anywhere.example/").unwrap()));
    }
}
