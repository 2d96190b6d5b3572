//! Extraction strategies and their generic interpreter
//!
//! A strategy is one deterministic attempt at pulling a raw fragment for a
//! field out of a parsed document. Strategies are plain data so selector chains
//! can live in configuration; `CompiledStrategy` is the ready-to-run form.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

use super::normalizer::normalize_text;
use crate::domain::StrategyKind;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Elements whose text never counts as visible page text
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Text of the first element matching a CSS selector
    Selector { selector: String },
    /// Attribute value of the first matching element carrying it
    Attribute { selector: String, attribute: String },
    /// Regex over the visible page text; capture group 1 when present
    PatternScan { pattern: String },
}

impl ExtractionStrategy {
    pub fn selector(selector: &str) -> Self {
        Self::Selector {
            selector: selector.to_string(),
        }
    }

    pub fn attribute(selector: &str, attribute: &str) -> Self {
        Self::Attribute {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn pattern(pattern: &str) -> Self {
        Self::PatternScan {
            pattern: pattern.to_string(),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Selector { .. } => StrategyKind::Selector,
            Self::Attribute { .. } => StrategyKind::Attribute,
            Self::PatternScan { .. } => StrategyKind::PatternScan,
        }
    }

    pub fn compile(&self) -> ParsingResult<CompiledStrategy> {
        match self {
            Self::Selector { selector } => Ok(CompiledStrategy::Selector(compile_selector(selector)?)),
            Self::Attribute {
                selector,
                attribute,
            } => Ok(CompiledStrategy::Attribute {
                selector: compile_selector(selector)?,
                attribute: attribute.clone(),
            }),
            Self::PatternScan { pattern } => Regex::new(pattern)
                .map(CompiledStrategy::PatternScan)
                .map_err(|e| ParsingError::invalid_pattern(pattern, e)),
        }
    }
}

fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// A strategy ready to evaluate against documents
#[derive(Debug, Clone)]
pub enum CompiledStrategy {
    Selector(Selector),
    Attribute { selector: Selector, attribute: String },
    PatternScan(Regex),
}

impl CompiledStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Selector(_) => StrategyKind::Selector,
            Self::Attribute { .. } => StrategyKind::Attribute,
            Self::PatternScan(_) => StrategyKind::PatternScan,
        }
    }

    /// Pull a raw fragment; `None` when nothing non-empty was found
    pub fn evaluate(&self, document: &Html, page_text: &PageText<'_>) -> Option<String> {
        let fragment = match self {
            Self::Selector(selector) => document
                .select(selector)
                .next()
                .map(|element| normalize_text(&element.text().collect::<String>())),
            Self::Attribute {
                selector,
                attribute,
            } => document
                .select(selector)
                .find_map(|element| element.value().attr(attribute))
                .map(|value| value.trim().to_string()),
            Self::PatternScan(regex) => regex.captures(page_text.get()).and_then(|captures| {
                captures
                    .get(1)
                    .or_else(|| captures.get(0))
                    .map(|m| m.as_str().trim().to_string())
            }),
        };

        fragment.filter(|text| !text.is_empty())
    }
}

/// Visible text of a document, collected on first use and shared by every
/// pattern scan run against that document
pub struct PageText<'a> {
    document: &'a Html,
    text: std::cell::OnceCell<String>,
}

impl<'a> PageText<'a> {
    pub fn new(document: &'a Html) -> Self {
        Self {
            document,
            text: std::cell::OnceCell::new(),
        }
    }

    pub fn get(&self) -> &str {
        self.text.get_or_init(|| visible_text(self.document))
    }
}

/// Text nodes outside script/style elements, joined by single spaces
pub fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| INVISIBLE_TAGS.contains(&el.value().name()));
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    normalize_text(&parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head>
            <script>var reviews = "999 Reviews";</script>
            <meta itemprop="ratingValue" content=" 4.7 ">
        </head>
        <body>
            <div class="rating"><strong>4.9</strong> out of 5</div>
            <span class="empty">   </span>
            <span data-sold-count="1,234"></span>
            <p>Customers left <b>321</b> Reviews so far</p>
        </body>
        </html>
    "#;

    fn eval(strategy: &ExtractionStrategy) -> Option<String> {
        let document = Html::parse_document(PAGE);
        let page_text = PageText::new(&document);
        strategy.compile().unwrap().evaluate(&document, &page_text)
    }

    #[test]
    fn test_selector_strategy_reads_first_match_text() {
        assert_eq!(eval(&ExtractionStrategy::selector(".rating")).as_deref(), Some("4.9 out of 5"));
        assert_eq!(eval(&ExtractionStrategy::selector(".rating strong")).as_deref(), Some("4.9"));
    }

    #[test]
    fn test_blank_and_missing_selectors_yield_nothing() {
        assert_eq!(eval(&ExtractionStrategy::selector(".empty")), None);
        assert_eq!(eval(&ExtractionStrategy::selector(".does-not-exist")), None);
    }

    #[test]
    fn test_attribute_strategy_trims_value() {
        assert_eq!(
            eval(&ExtractionStrategy::attribute("[itemprop=ratingValue]", "content")).as_deref(),
            Some("4.7")
        );
        assert_eq!(
            eval(&ExtractionStrategy::attribute("span", "data-sold-count")).as_deref(),
            Some("1,234")
        );
    }

    #[test]
    fn test_pattern_scan_ignores_script_text() {
        let strategy = ExtractionStrategy::pattern(r"(?i)([0-9][0-9,]*)\s*Reviews?");
        assert_eq!(eval(&strategy).as_deref(), Some("321"));
    }

    #[test]
    fn test_pattern_without_group_returns_whole_match() {
        let strategy = ExtractionStrategy::pattern(r"[0-9]+ Reviews");
        assert_eq!(eval(&strategy).as_deref(), Some("321 Reviews"));
    }

    #[test]
    fn test_invalid_definitions_fail_to_compile() {
        assert!(matches!(
            ExtractionStrategy::selector("div[").compile(),
            Err(ParsingError::InvalidSelector { .. })
        ));
        assert!(matches!(
            ExtractionStrategy::pattern("(unclosed").compile(),
            Err(ParsingError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_strategy_config_round_trips_through_json() {
        let json = r#"{"kind":"attribute","selector":"meta[itemprop=reviewCount]","attribute":"content"}"#;
        let strategy: ExtractionStrategy = serde_json::from_str(json).unwrap();
        assert_eq!(strategy, ExtractionStrategy::attribute("meta[itemprop=reviewCount]", "content"));
        assert_eq!(strategy.kind(), StrategyKind::Attribute);
    }
}
