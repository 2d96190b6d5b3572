//! Error types for extraction, transport and single-item scraping
//!
//! `ParsingError` covers extractor construction and unusable documents,
//! `TransportError` is raised by fetch collaborators, and `ScrapeError` is the
//! classified failure surfaced by a single fetch-and-extract.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("HTML parsing failed: {message}")]
    HtmlParsingFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String, field: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn html_parsing_failed(message: impl Into<String>) -> Self {
        Self::HtmlParsingFailed {
            message: message.into(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

/// Failure of a raw-document fetch collaborator
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects (limit {limit})")]
    TooManyRedirects { limit: usize },

    #[error("invalid redirect location: {0}")]
    InvalidRedirect(String),

    #[error("redirect leaves the allowed domains: {0}")]
    RedirectNotAllowed(String),

    #[error("request failed: {0}")]
    Request(String),
}

pub use crate::domain::ErrorKind;

/// Classified failure of a single fetch-and-extract
#[derive(Error, Debug, Clone)]
pub enum ScrapeError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(#[source] TransportError),

    #[error("upstream returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("document could not be parsed: {0}")]
    Parse(#[from] ParsingError),
}

impl From<TransportError> for ScrapeError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::RedirectNotAllowed(url) => {
                Self::Validation(format!("redirect to a domain that is not allowed: {url}"))
            }
            other => Self::Network(other),
        }
    }
}

impl ScrapeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::HttpStatus { .. } => ErrorKind::HttpStatusError,
            Self::Parse(_) => ErrorKind::ParseError,
        }
    }

    /// Validation failures are the caller's fault and never worth retrying
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if a later attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Parse(_) => false,
            Self::Network(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        }
    }
}
