//! Infrastructure layer for parsing, fetching and external integrations
//!
//! This module provides HTML extraction, the HTTP document fetcher, the
//! rendered-page collaborator seam, configuration, logging and request signing.

pub mod config; // Configuration structs, defaults and loading
pub mod http_client; // reqwest-backed document fetcher
pub mod logging; // Logging infrastructure
pub mod parsing; // Strategy-driven field extraction
pub mod parsing_error; // Error types
pub mod rendered_fetcher; // Rendered-page collaborator interface
pub mod request_signer; // Marketplace API signatures

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use http_client::{DocumentFetcher, FetchRequest, HttpClient, HttpClientConfig, RawDocument};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{ParsingConfig, ProductMetricsParser};
pub use parsing_error::{ErrorKind, ParsingError, ParsingResult, ScrapeError, TransportError};
pub use rendered_fetcher::{RenderedFetcher, RenderedFields};
