//! Application layer module
//!
//! This module contains the use cases that orchestrate extraction:
//! single-item fetch-and-extract and sequential batch runs.

pub mod batch_orchestrator;
pub mod scrape_service;

pub use batch_orchestrator::BatchOrchestrator;
pub use scrape_service::ProductScraper;
