//! Rendered-document fetch collaborator
//!
//! Some product pages only carry their metrics after client-side scripts run.
//! A `RenderedFetcher` loads such a page in an execution context of its own,
//! runs the configured strategy chains there and hands back one raw fragment
//! per field. Implementations must release the execution context before
//! returning, on success and on every error path.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::parsing::FieldCandidate;
use super::parsing_error::TransportError;
use crate::domain::FieldName;

/// Raw fragment for one field and the 1-based rank of the strategy behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedFragment {
    pub raw: String,
    pub rank: usize,
}

/// Fragments a rendered page produced; fields absent from the map had no match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedFields {
    pub fields: BTreeMap<FieldName, RenderedFragment>,
}

impl RenderedFields {
    pub fn insert(&mut self, field: FieldName, raw: impl Into<String>, rank: usize) {
        self.fields.insert(
            field,
            RenderedFragment {
                raw: raw.into(),
                rank,
            },
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str, usize)> {
        self.fields
            .iter()
            .map(|(field, fragment)| (*field, fragment.raw.as_str(), fragment.rank))
    }
}

#[async_trait]
pub trait RenderedFetcher: Send + Sync {
    async fn render_and_extract_fields(
        &self,
        url: &Url,
        candidates: &[FieldCandidate],
    ) -> Result<RenderedFields, TransportError>;
}
