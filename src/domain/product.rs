//! Product extraction entities
//!
//! Targets, field names and the `ProductRecord` produced by the field extractor,
//! including the per-field provenance map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// One product to scrape. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionTarget {
    /// Full product page address
    Url { url: Url },
    /// Marketplace product id, resolved through the configured page template
    ProductId { product_id: String },
    /// Raw document supplied by the caller, with its position in the request
    Document { html: String, index: usize },
}

impl ExtractionTarget {
    pub fn url(url: Url) -> Self {
        Self::Url { url }
    }

    pub fn product_id(product_id: impl Into<String>) -> Self {
        Self::ProductId {
            product_id: product_id.into(),
        }
    }

    pub fn document(html: impl Into<String>, index: usize) -> Self {
        Self::Document {
            html: html.into(),
            index,
        }
    }

    /// Short human-readable label used in logs and batch results
    pub fn label(&self) -> String {
        match self {
            Self::Url { url } => url.to_string(),
            Self::ProductId { product_id } => format!("product:{product_id}"),
            Self::Document { index, .. } => format!("document#{index}"),
        }
    }
}

impl fmt::Display for ExtractionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The metrics extracted from a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Rating,
    Reviews,
    Sold,
    Title,
    Price,
}

impl FieldName {
    pub const ALL: [FieldName; 5] = [
        FieldName::Rating,
        FieldName::Reviews,
        FieldName::Sold,
        FieldName::Title,
        FieldName::Price,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Rating | Self::Price => FieldKind::Decimal,
            Self::Reviews | Self::Sold => FieldKind::Integer,
            Self::Title => FieldKind::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Reviews => "reviews",
            Self::Sold => "sold",
            Self::Title => "title",
            Self::Price => "price",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field's raw fragment is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Decimal,
    Integer,
    Text,
}

/// Kind of strategy that produced a value, kept in provenance for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Selector,
    Attribute,
    PatternScan,
    /// Value reported by a rendered-page collaborator
    Rendered,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Selector => "selector",
            Self::Attribute => "attribute",
            Self::PatternScan => "pattern_scan",
            Self::Rendered => "rendered",
        };
        f.write_str(name)
    }
}

/// Which strategy (by 1-based rank) produced a field, or that none did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Provenance {
    Matched { rank: usize, strategy: StrategyKind },
    NoneMatched,
}

impl Provenance {
    pub fn rank(&self) -> Option<usize> {
        match self {
            Self::Matched { rank, .. } => Some(*rank),
            Self::NoneMatched => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched { rank, strategy } => write!(f, "rank {rank} ({strategy})"),
            Self::NoneMatched => f.write_str("none matched"),
        }
    }
}

/// Result of extracting one product page
///
/// Numeric fields are always finite and non-negative; missing values stay at
/// their defaults and are reported as `Provenance::NoneMatched`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub price: f64,
    pub rating: f64,
    pub reviews: u64,
    pub sold: u64,
    pub provenance: BTreeMap<FieldName, Provenance>,
}

impl Default for ProductRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            price: 0.0,
            rating: 0.0,
            reviews: 0,
            sold: 0,
            provenance: FieldName::ALL
                .iter()
                .map(|field| (*field, Provenance::NoneMatched))
                .collect(),
        }
    }
}

impl ProductRecord {
    pub fn provenance_of(&self, field: FieldName) -> Provenance {
        self.provenance
            .get(&field)
            .copied()
            .unwrap_or(Provenance::NoneMatched)
    }

    /// Number of fields that some strategy resolved
    pub fn matched_fields(&self) -> usize {
        self.provenance.values().filter(|p| p.is_matched()).count()
    }
}
