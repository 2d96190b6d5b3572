//! Product Metrics Scraper - e-commerce product page extraction service
//!
//! Fetches marketplace product pages and extracts rating, review count, units
//! sold, title and price through ordered, configurable strategy chains, one
//! item at a time or as paced batches behind a small HTTP API.

// Module declarations
pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use application::{BatchOrchestrator, ProductScraper};
pub use domain::{BatchReport, ExtractionTarget, ProductRecord};
pub use infrastructure::{AppConfig, ScrapeError};
