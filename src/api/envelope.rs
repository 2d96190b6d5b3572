//! JSON response envelope
//!
//! Every route answers `{success, data | error, timestamp}`; batch runs answer
//! `{success, batch_summary, results, timestamp}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{BatchItemResult, BatchReport, BatchSummary};
use crate::infrastructure::parsing_error::{ErrorKind, ScrapeError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct BatchEnvelope {
    pub success: bool,
    pub batch_summary: BatchSummary,
    pub results: Vec<BatchItemResult>,
    pub timestamp: DateTime<Utc>,
}

impl From<BatchReport> for BatchEnvelope {
    fn from(report: BatchReport) -> Self {
        Self {
            success: true,
            batch_summary: report.batch_summary,
            results: report.results,
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for BatchEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A failed request: validation problems are 400, everything else 500
#[derive(Debug)]
pub struct ApiError(pub ScrapeError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(ScrapeError::validation(message))
    }

    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<ScrapeError> for ApiError {
    fn from(error: ScrapeError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Envelope::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody {
                kind: self.0.kind(),
                message: self.0.to_string(),
            }),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
