//! Product metrics parser
//!
//! Turns a product page into a `ProductRecord`. Every field is resolved by the
//! same loop over its compiled strategy chain; the first strategy producing a
//! usable fragment wins and its rank is kept as provenance.

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::config::FieldSelectors;
use super::normalizer::{has_numeric_run, normalize_decimal, normalize_integer, normalize_text};
use super::strategy::{CompiledStrategy, ExtractionStrategy, PageText};
use crate::domain::{FieldKind, FieldName, ProductRecord, Provenance, StrategyKind};
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// A field together with its ordered strategy chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub field: FieldName,
    pub strategies: Vec<ExtractionStrategy>,
}

struct CompiledField {
    field: FieldName,
    strategies: Vec<CompiledStrategy>,
}

/// Parser for extracting product metrics from product pages
pub struct ProductMetricsParser {
    candidates: Vec<FieldCandidate>,
    compiled: Vec<CompiledField>,
}

impl ProductMetricsParser {
    /// Create a parser with the default strategy chains
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&FieldSelectors::default())
    }

    /// Create a parser with custom strategy chains
    pub fn with_config(selectors: &FieldSelectors) -> ParsingResult<Self> {
        let candidates: Vec<FieldCandidate> = FieldName::ALL
            .iter()
            .map(|field| FieldCandidate {
                field: *field,
                strategies: selectors.for_field(*field).to_vec(),
            })
            .collect();

        let mut compiled = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if candidate.strategies.is_empty() {
                return Err(ParsingError::ConfigurationError {
                    message: format!("no extraction strategies configured for {}", candidate.field),
                    field: candidate.field.to_string(),
                });
            }
            let strategies = candidate
                .strategies
                .iter()
                .map(ExtractionStrategy::compile)
                .collect::<ParsingResult<Vec<_>>>()?;
            compiled.push(CompiledField {
                field: candidate.field,
                strategies,
            });
        }

        Ok(Self {
            candidates,
            compiled,
        })
    }

    /// The configured chains, as handed to rendered-page collaborators
    pub fn candidates(&self) -> &[FieldCandidate] {
        &self.candidates
    }

    /// Parse raw markup and extract a record
    pub fn parse_document(&self, html: &str) -> ParsingResult<ProductRecord> {
        if html.trim().is_empty() {
            return Err(ParsingError::html_parsing_failed("document is empty"));
        }
        if !html.contains('<') {
            return Err(ParsingError::html_parsing_failed("document contains no markup"));
        }

        let document = Html::parse_document(html);
        Ok(self.extract(&document))
    }

    /// Extract every field; misses keep their defaults and never fail
    pub fn extract(&self, document: &Html) -> ProductRecord {
        let page_text = PageText::new(document);
        let mut record = ProductRecord::default();

        for field in &self.compiled {
            let provenance = field
                .strategies
                .iter()
                .enumerate()
                .find_map(|(position, strategy)| {
                    let rank = position + 1;
                    let Some(fragment) = strategy.evaluate(document, &page_text) else {
                        trace!(field = %field.field, rank, "strategy found nothing");
                        return None;
                    };
                    if apply_fragment(&mut record, field.field, &fragment) {
                        debug!(field = %field.field, rank, strategy = %strategy.kind(), fragment = %fragment, "field matched");
                        Some(Provenance::Matched {
                            rank,
                            strategy: strategy.kind(),
                        })
                    } else {
                        trace!(field = %field.field, rank, fragment = %fragment, "fragment not usable");
                        None
                    }
                })
                .unwrap_or_else(|| {
                    debug!(field = %field.field, "no strategy matched");
                    Provenance::NoneMatched
                });

            record.provenance.insert(field.field, provenance);
        }

        record
    }
}

/// Normalize `fragment` into the record; false when the fragment is unusable
/// for the field's kind and the next strategy should be tried
pub fn apply_fragment(record: &mut ProductRecord, field: FieldName, fragment: &str) -> bool {
    match field.kind() {
        FieldKind::Text => {
            let text = normalize_text(fragment);
            if text.is_empty() {
                return false;
            }
            record.title = text;
        }
        FieldKind::Decimal | FieldKind::Integer if !has_numeric_run(fragment) => return false,
        FieldKind::Decimal => {
            let value = normalize_decimal(fragment);
            match field {
                FieldName::Price => record.price = value,
                _ => record.rating = value,
            }
        }
        FieldKind::Integer => {
            let value = normalize_integer(fragment);
            match field {
                FieldName::Sold => record.sold = value,
                _ => record.reviews = value,
            }
        }
    }
    true
}

/// Build a record from fragments already pulled by a rendered-page
/// collaborator, applying the same normalization and provenance rules
pub fn record_from_fragments<'a>(
    fragments: impl IntoIterator<Item = (FieldName, &'a str, usize)>,
) -> ProductRecord {
    let mut record = ProductRecord::default();
    for (field, fragment, rank) in fragments {
        if apply_fragment(&mut record, field, fragment) {
            record.provenance.insert(
                field,
                Provenance::Matched {
                    rank,
                    strategy: StrategyKind::Rendered,
                },
            );
        }
    }
    record
}
