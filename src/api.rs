//! HTTP surface
//!
//! Routes:
//! - `GET  /health`
//! - `GET  /scrape/url?url=`
//! - `GET  /scrape/product?productId=`
//! - `POST /scrape/html` with `{html}`
//! - `POST /scrape/batch` with `{urls: [...]}`

pub mod envelope;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::{BatchOrchestrator, ProductScraper};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<ProductScraper>,
    pub orchestrator: Arc<BatchOrchestrator>,
}

impl AppState {
    pub fn new(scraper: Arc<ProductScraper>, orchestrator: Arc<BatchOrchestrator>) -> Self {
        Self {
            scraper,
            orchestrator,
        }
    }
}

/// Build the axum Router with all endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/scrape/url", get(routes::scrape_url))
        .route("/scrape/product", get(routes::scrape_product))
        .route("/scrape/html", post(routes::scrape_html))
        .route("/scrape/batch", post(routes::scrape_batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("HTTP surface listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP surface stopped");
    Ok(())
}
