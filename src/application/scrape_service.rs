//! Single-item fetch-and-extract
//!
//! `ProductScraper` validates a target, fetches its page through the
//! configured `DocumentFetcher` and hands the body to the metrics parser.
//! Every failure leaves here classified as a `ScrapeError`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info};
use url::Url;

use crate::domain::{ExtractionTarget, ProductRecord};
use crate::infrastructure::config::ScraperConfig;
use crate::infrastructure::http_client::{DocumentFetcher, FetchRequest, host_allowed};
use crate::infrastructure::parsing::ProductMetricsParser;
use crate::infrastructure::parsing::product_metrics_parser::record_from_fragments;
use crate::infrastructure::parsing_error::ScrapeError;
use crate::infrastructure::rendered_fetcher::RenderedFetcher;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches and extracts one product at a time
pub struct ProductScraper {
    fetcher: Arc<dyn DocumentFetcher>,
    rendered: Option<Arc<dyn RenderedFetcher>>,
    parser: Arc<ProductMetricsParser>,
    config: ScraperConfig,
}

impl ProductScraper {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        parser: Arc<ProductMetricsParser>,
        config: ScraperConfig,
    ) -> Self {
        Self {
            fetcher,
            rendered: None,
            parser,
            config,
        }
    }

    /// Attach a collaborator for pages that need client-side rendering
    #[must_use]
    pub fn with_rendered_fetcher(mut self, rendered: Arc<dyn RenderedFetcher>) -> Self {
        self.rendered = Some(rendered);
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Page address for a marketplace product id
    pub fn product_url(&self, product_id: &str) -> Result<Url, ScrapeError> {
        if product_id.is_empty() || !product_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ScrapeError::validation(format!(
                "product id must be a non-empty string of digits, got {product_id:?}"
            )));
        }

        let address = self.config.product_url_template.replace("{id}", product_id);
        Url::parse(&address)
            .map_err(|e| ScrapeError::validation(format!("invalid product address {address:?}: {e}")))
    }

    /// Check a page address against the scheme and domain allowlist
    pub fn validate_url(&self, url: &Url) -> Result<(), ScrapeError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::validation(format!(
                "unsupported URL scheme {:?}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ScrapeError::validation(format!("URL has no host: {url}")))?;

        if !host_allowed(url, &self.config.allowed_domains) {
            return Err(ScrapeError::validation(format!("domain not allowed: {host}")));
        }

        Ok(())
    }

    /// Resolve a target to the page address it stands for; `None` for
    /// documents that need no fetch
    pub fn resolve(&self, target: &ExtractionTarget) -> Result<Option<Url>, ScrapeError> {
        match target {
            ExtractionTarget::Url { url } => {
                self.validate_url(url)?;
                Ok(Some(url.clone()))
            }
            ExtractionTarget::ProductId { product_id } => {
                let url = self.product_url(product_id)?;
                self.validate_url(&url)?;
                Ok(Some(url))
            }
            ExtractionTarget::Document { html, .. } => {
                if html.trim().is_empty() {
                    return Err(ScrapeError::validation("document is empty"));
                }
                Ok(None)
            }
        }
    }

    /// Fetch one target and extract its metrics
    pub async fn fetch_and_extract(
        &self,
        target: &ExtractionTarget,
    ) -> Result<ProductRecord, ScrapeError> {
        let url = match (self.resolve(target)?, target) {
            (Some(url), _) => url,
            (None, ExtractionTarget::Document { html, .. }) => {
                return Ok(self.parser.parse_document(html)?);
            }
            (None, _) => return Err(ScrapeError::validation("target has no page address")),
        };

        let request = self.build_request(url)?;
        let document = self.fetcher.fetch(&request).await?;
        if document.final_url != request.url {
            self.validate_url(&document.final_url)?;
        }

        if !document.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: document.status,
                url: document.final_url.to_string(),
            });
        }

        debug!("Extracting {} ({} bytes)", document.final_url, document.body.len());
        let record = self.parser.parse_document(&document.body)?;
        info!(
            target = %target,
            matched = record.matched_fields(),
            "Extracted product metrics"
        );
        Ok(record)
    }

    /// Extract metrics from a page that only renders client-side
    pub async fn render_and_extract(&self, url: &Url) -> Result<ProductRecord, ScrapeError> {
        let rendered = self
            .rendered
            .as_ref()
            .ok_or_else(|| ScrapeError::validation("no rendered-page fetcher configured"))?;
        self.validate_url(url)?;

        let fields = rendered
            .render_and_extract_fields(url, self.parser.candidates())
            .await?;
        Ok(record_from_fragments(fields.iter()))
    }

    fn build_request(&self, url: Url) -> Result<FetchRequest, ScrapeError> {
        let header = |value: &str, name: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::validation(format!("invalid {name} header: {e}")))
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header(&self.config.user_agent, "user-agent")?);
        headers.insert(ACCEPT_LANGUAGE, header(&self.config.accept_language, "accept-language")?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        Ok(FetchRequest {
            url,
            allowed_domains: self.config.allowed_domains.clone(),
            headers,
            timeout: Duration::from_secs(self.config.timeout_seconds),
            max_redirects: self.config.max_redirects,
        })
    }
}
