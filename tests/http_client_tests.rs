//! `HttpClient` against a local axum server

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use reqwest::header::HeaderMap;
use tokio::net::TcpListener;
use url::Url;

use product_metrics_scraper::infrastructure::config::ScraperConfig;
use product_metrics_scraper::infrastructure::{
    DocumentFetcher, ErrorKind, FetchRequest, HttpClient, HttpClientConfig, ProductMetricsParser,
    TransportError,
};
use product_metrics_scraper::{ExtractionTarget, ProductScraper};

async fn spawn_server() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // same server under another host name
    let offsite = format!("http://localhost:{}/item/1.html", addr.port());

    let app = Router::new()
        .route("/item/1.html", get(|| async { "<html><body>ok</body></html>" }))
        .route(
            "/old/1.html",
            get(|| async { (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/item/1.html")]).into_response() }),
        )
        .route(
            "/loop",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/loop")]).into_response() }),
        )
        .route(
            "/offsite",
            get(move || {
                let location = offsite.clone();
                async move { (StatusCode::FOUND, [(header::LOCATION, location)]).into_response() }
            }),
        )
        .route("/gone", get(|| async { (StatusCode::GONE, "gone").into_response() }))
        .route(
            "/echo-agent",
            get(|headers: axum::http::HeaderMap| async move {
                headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

fn request(base: &Url, path: &str, max_redirects: usize) -> FetchRequest {
    FetchRequest {
        url: base.join(path).unwrap(),
        headers: HeaderMap::new(),
        timeout: Duration::from_secs(5),
        max_redirects,
        allowed_domains: Vec::new(),
    }
}

fn guarded(base: &Url, path: &str) -> FetchRequest {
    FetchRequest {
        allowed_domains: vec!["127.0.0.1".to_string()],
        ..request(base, path, 5)
    }
}

fn client() -> HttpClient {
    HttpClient::new(HttpClientConfig::default()).unwrap()
}

#[tokio::test]
async fn test_fetch_plain_page() {
    let base = spawn_server().await;
    let doc = client().fetch(&request(&base, "item/1.html", 5)).await.unwrap();

    assert_eq!(doc.status, 200);
    assert!(doc.body.contains("ok"));
}

#[tokio::test]
async fn test_relative_redirect_is_followed() {
    let base = spawn_server().await;
    let doc = client().fetch(&request(&base, "old/1.html", 5)).await.unwrap();

    assert_eq!(doc.status, 200);
    assert_eq!(doc.final_url.path(), "/item/1.html");
}

#[tokio::test]
async fn test_redirect_off_the_allowlist_is_not_followed() {
    let base = spawn_server().await;

    let doc = client().fetch(&guarded(&base, "old/1.html")).await.unwrap();
    assert_eq!(doc.final_url.path(), "/item/1.html");

    let err = client().fetch(&guarded(&base, "offsite")).await.unwrap_err();
    assert!(matches!(&err, TransportError::RedirectNotAllowed(url) if url.contains("localhost")), "{err:?}");
}

#[tokio::test]
async fn test_scraper_rejects_redirect_to_unlisted_host() {
    let base = spawn_server().await;
    let config = ScraperConfig {
        allowed_domains: vec!["127.0.0.1".to_string()],
        ..ScraperConfig::default()
    };
    let scraper = ProductScraper::new(
        Arc::new(client()),
        Arc::new(ProductMetricsParser::new().unwrap()),
        config,
    );

    let err = scraper
        .fetch_and_extract(&ExtractionTarget::url(base.join("offsite").unwrap()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_redirect_limit() {
    let base = spawn_server().await;
    let err = client().fetch(&request(&base, "loop", 3)).await.unwrap_err();
    assert!(matches!(err, TransportError::TooManyRedirects { limit: 3 }));

    let err = client().fetch(&request(&base, "old/1.html", 0)).await.unwrap_err();
    assert!(matches!(err, TransportError::TooManyRedirects { limit: 0 }));
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let base = spawn_server().await;
    let doc = client().fetch(&request(&base, "gone", 5)).await.unwrap();

    assert_eq!(doc.status, 410);
    assert!(!doc.is_success());
}

#[tokio::test]
async fn test_default_user_agent_is_sent() {
    let base = spawn_server().await;
    let doc = client().fetch(&request(&base, "echo-agent", 0)).await.unwrap();
    assert!(doc.body.starts_with("Mozilla/5.0"));
}

#[tokio::test]
async fn test_connection_refused_is_a_connect_error() {
    // bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = Url::parse(&format!("http://{addr}/")).unwrap();
    let err = client().fetch(&request(&base, "item/1.html", 0)).await.unwrap_err();
    assert!(matches!(err, TransportError::Connect(_)), "{err:?}");
}
