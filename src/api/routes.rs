//! Route handlers
//!
//! Handlers turn untyped request input into `ExtractionTarget`s and delegate
//! to the scraper or the batch orchestrator. Malformed input is answered with
//! a 400 envelope, never axum's plain-text rejection.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use url::Url;

use super::AppState;
use super::envelope::{ApiError, BatchEnvelope, Envelope};
use crate::domain::{ExtractionTarget, ProductRecord};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HtmlRequest {
    pub html: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}

pub async fn scrape_url(
    State(state): State<AppState>,
    query: Result<Query<UrlQuery>, QueryRejection>,
) -> ApiResult<Envelope<ProductRecord>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let url = required(query.url, "url")?;
    let target = ExtractionTarget::url(parse_url(&url)?);

    info!("Single scrape requested: {}", target);
    let record = state.scraper.fetch_and_extract(&target).await?;
    Ok(Envelope::ok(record))
}

pub async fn scrape_product(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> ApiResult<Envelope<ProductRecord>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let product_id = required(query.product_id, "productId")?;
    let target = ExtractionTarget::product_id(product_id);

    info!("Product scrape requested: {}", target);
    let record = state.scraper.fetch_and_extract(&target).await?;
    Ok(Envelope::ok(record))
}

pub async fn scrape_html(
    State(state): State<AppState>,
    payload: Result<Json<HtmlRequest>, JsonRejection>,
) -> ApiResult<Envelope<ProductRecord>> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let html = required(payload.html, "html")?;

    let record = state
        .scraper
        .fetch_and_extract(&ExtractionTarget::document(html, 0))
        .await?;
    Ok(Envelope::ok(record))
}

pub async fn scrape_batch(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<BatchEnvelope> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let targets = batch_targets(&payload, state.orchestrator.config().max_batch_size)?;

    info!("Batch scrape requested: {} targets", targets.len());
    let report = state.orchestrator.run_batch(targets).await?;
    Ok(report.into())
}

/// Validate a batch body: `urls` must be a non-empty array of address strings
/// no longer than the batch limit
fn batch_targets(payload: &Value, max_batch_size: usize) -> ApiResult<Vec<ExtractionTarget>> {
    let urls = payload
        .get("urls")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::validation("urls must be an array of strings"))?;

    if urls.is_empty() {
        return Err(ApiError::validation("urls must not be empty"));
    }
    if urls.len() > max_batch_size {
        return Err(ApiError::validation(format!(
            "batch of {} exceeds the maximum of {}",
            urls.len(),
            max_batch_size
        )));
    }

    urls.iter()
        .map(|value| {
            let url = value
                .as_str()
                .ok_or_else(|| ApiError::validation("urls must be an array of strings"))?;
            Ok(ExtractionTarget::url(parse_url(url)?))
        })
        .collect()
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{name} is required")))
}

fn parse_url(raw: &str) -> ApiResult<Url> {
    Url::parse(raw.trim()).map_err(|e| ApiError::validation(format!("invalid URL {raw:?}: {e}")))
}
