//! HTML parsing infrastructure for product metrics
//!
//! Strategy chains live in configuration, are compiled once into a
//! `ProductMetricsParser`, and every fragment they produce goes through the
//! normalizer.

pub mod config;
pub mod normalizer;
pub mod product_metrics_parser;
pub mod strategy;

// Re-export public types
pub use super::parsing_error::{ParsingError, ParsingResult};
pub use config::{FieldSelectors, ParsingConfig};
pub use normalizer::{NumericKind, normalize_number};
pub use product_metrics_parser::{FieldCandidate, ProductMetricsParser};
pub use strategy::{CompiledStrategy, ExtractionStrategy};
