//! Domain module - extraction and batch entities
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod batch;
pub mod product;

pub use batch::{BatchItemResult, ErrorKind, BatchReport, BatchState, BatchSummary};
pub use product::{ExtractionTarget, FieldKind, FieldName, ProductRecord, Provenance, StrategyKind};
