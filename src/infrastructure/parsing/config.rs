//! Parsing configuration for product metric extraction
//!
//! Ordered strategy chains per field. Chains are tried first to last, so the
//! most specific markup goes first and pattern scans go last.

use serde::{Deserialize, Serialize};

use super::strategy::ExtractionStrategy;
use crate::domain::FieldName;

/// Main parsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Strategy chains per extracted field
    pub field_selectors: FieldSelectors,
}

/// Strategy chains for product page fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSelectors {
    pub rating: Vec<ExtractionStrategy>,
    pub reviews: Vec<ExtractionStrategy>,
    pub sold: Vec<ExtractionStrategy>,
    pub title: Vec<ExtractionStrategy>,
    pub price: Vec<ExtractionStrategy>,
}

impl FieldSelectors {
    pub fn for_field(&self, field: FieldName) -> &[ExtractionStrategy] {
        match field {
            FieldName::Rating => &self.rating,
            FieldName::Reviews => &self.reviews,
            FieldName::Sold => &self.sold,
            FieldName::Title => &self.title,
            FieldName::Price => &self.price,
        }
    }
}

impl Default for FieldSelectors {
    fn default() -> Self {
        use ExtractionStrategy as S;
        Self {
            rating: vec![
                S::selector(".reviewer--rating--xrWWFzx strong"),
                S::selector(".overview-rating-average"),
                S::attribute("[itemprop=\"ratingValue\"]", "content"),
                S::selector("[itemprop=\"ratingValue\"]"),
                S::attribute("[data-rating]", "data-rating"),
                S::pattern(r"(?i)([0-9](?:\.[0-9])?)\s*(?:out of 5|/\s*5)"),
            ],
            reviews: vec![
                S::selector(".reviewer--reviews--cx7Zs_V"),
                S::selector(".product-reviewer-reviews"),
                S::attribute("[itemprop=\"reviewCount\"]", "content"),
                S::selector("[itemprop=\"reviewCount\"]"),
                S::pattern(r"(?i)([0-9][0-9,.]*)\s*(?:Reviews?|ratings?)"),
            ],
            sold: vec![
                S::selector(".reviewer--sold--ytPeoEy"),
                S::selector(".product-reviewer-sold"),
                S::attribute("[data-sold-count]", "data-sold-count"),
                S::pattern(r"(?i)([0-9][0-9,.]*\+?)\s*(?:sold|orders?)"),
            ],
            title: vec![
                S::selector("h1[data-pl=\"product-title\"]"),
                S::selector(".title--wrap--UUHae_g h1"),
                S::selector(".product-title-text"),
                S::attribute("meta[property=\"og:title\"]", "content"),
                S::selector("title"),
            ],
            price: vec![
                S::selector(".product-price-current"),
                S::selector(".price--currentPriceText--V8_y_b5"),
                S::attribute("[itemprop=\"price\"]", "content"),
                S::attribute("meta[property=\"product:price:amount\"]", "content"),
                S::pattern(r"(?:US\s*)?\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)"),
            ],
        }
    }
}
