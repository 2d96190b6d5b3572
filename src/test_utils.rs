//! Test utilities for product-metrics-scraper
//!
//! Scripted in-memory collaborators so tests never touch the network, plus
//! product page fixtures and a ready-wired scraper/orchestrator context.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use url::Url;

use crate::application::{BatchOrchestrator, ProductScraper};
use crate::infrastructure::config::{AppConfig, BatchConfig};
use crate::infrastructure::http_client::{DocumentFetcher, FetchRequest, RawDocument};
use crate::infrastructure::parsing::{FieldCandidate, ProductMetricsParser};
use crate::infrastructure::parsing_error::TransportError;
use crate::infrastructure::rendered_fetcher::{RenderedFetcher, RenderedFields};

/// What a scripted address answers with
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Page { status: u16, body: String },
    /// A page reached after the fetcher followed redirects to `final_url`
    Redirected { final_url: Url, body: String },
    Error(TransportError),
}

/// `DocumentFetcher` answering from a fixed table and recording every request
///
/// Unknown addresses answer 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, ScriptedResponse>,
    requests: Mutex<Vec<FetchRequest>>,
}

fn normalize(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), |u| u.to_string())
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses.insert(
            normalize(url),
            ScriptedResponse::Page {
                status: 200,
                body: body.into(),
            },
        );
        self
    }

    #[must_use]
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(
            normalize(url),
            ScriptedResponse::Page {
                status,
                body: String::new(),
            },
        );
        self
    }

    #[must_use]
    pub fn with_redirected_page(mut self, url: &str, final_url: Url, body: impl Into<String>) -> Self {
        self.responses.insert(
            normalize(url),
            ScriptedResponse::Redirected {
                final_url,
                body: body.into(),
            },
        );
        self
    }

    #[must_use]
    pub fn with_error(mut self, url: &str, error: TransportError) -> Self {
        self.responses
            .insert(normalize(url), ScriptedResponse::Error(error));
        self
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.url.to_string())
            .collect()
    }
}

#[async_trait]
impl DocumentFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawDocument, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match self.responses.get(request.url.as_str()) {
            Some(ScriptedResponse::Page { status, body }) => Ok(RawDocument {
                status: *status,
                final_url: request.url.clone(),
                body: body.clone(),
            }),
            Some(ScriptedResponse::Redirected { final_url, body }) => Ok(RawDocument {
                status: 200,
                final_url: final_url.clone(),
                body: body.clone(),
            }),
            Some(ScriptedResponse::Error(error)) => Err(error.clone()),
            None => Ok(RawDocument {
                status: 404,
                final_url: request.url.clone(),
                body: String::new(),
            }),
        }
    }
}

/// `RenderedFetcher` returning fixed fragments
#[derive(Debug, Default)]
pub struct ScriptedRenderedFetcher {
    fields: RenderedFields,
    candidate_counts: Mutex<Vec<usize>>,
}

impl ScriptedRenderedFetcher {
    pub fn new(fields: RenderedFields) -> Self {
        Self {
            fields,
            candidate_counts: Mutex::new(Vec::new()),
        }
    }

    /// Number of field candidates handed over on each call
    pub fn candidate_counts(&self) -> Vec<usize> {
        self.candidate_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RenderedFetcher for ScriptedRenderedFetcher {
    async fn render_and_extract_fields(
        &self,
        _url: &Url,
        candidates: &[FieldCandidate],
    ) -> Result<RenderedFields, TransportError> {
        self.candidate_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(candidates.len());
        Ok(self.fields.clone())
    }
}

/// Product page using the marketplace's primary markup for every field
pub fn product_page(rating: f64, reviews: u64, sold: u64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Product page</title></head>
<body>
  <h1 data-pl="product-title">Test Product</h1>
  <div class="product-price-current">US $19.99</div>
  <div class="reviewer--rating--xrWWFzx"><strong>{rating}</strong></div>
  <a class="reviewer--reviews--cx7Zs_V">{reviews} Reviews</a>
  <span class="reviewer--sold--ytPeoEy">{sold} sold</span>
</body>
</html>"#
    )
}

/// Scraper and orchestrator wired to a scripted fetcher
pub struct TestContext {
    pub fetcher: Arc<ScriptedFetcher>,
    pub scraper: Arc<ProductScraper>,
    pub orchestrator: Arc<BatchOrchestrator>,
    pub config: AppConfig,
}

impl TestContext {
    /// Default configuration with pacing disabled
    pub fn new(fetcher: ScriptedFetcher) -> Self {
        let mut config = AppConfig::default();
        config.batch = BatchConfig {
            pacing_delay_ms: 0,
            ..BatchConfig::default()
        };
        Self::with_config(fetcher, config)
    }

    pub fn with_config(fetcher: ScriptedFetcher, config: AppConfig) -> Self {
        let fetcher = Arc::new(fetcher);
        let parser = ProductMetricsParser::with_config(&config.parsing.field_selectors)
            .unwrap_or_else(|e| panic!("default selectors must compile: {e}"));
        let scraper = Arc::new(ProductScraper::new(
            fetcher.clone(),
            Arc::new(parser),
            config.scraper.clone(),
        ));
        let orchestrator = Arc::new(BatchOrchestrator::new(scraper.clone(), config.batch.clone()));

        Self {
            fetcher,
            scraper,
            orchestrator,
            config,
        }
    }
}
