use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use product_metrics_scraper::api::{self, AppState};
use product_metrics_scraper::infrastructure::config::{self, AppConfig, ConfigManager};
use product_metrics_scraper::infrastructure::logging::{init_logging_with_config, log_system_info};
use product_metrics_scraper::infrastructure::{HttpClient, HttpClientConfig, ProductMetricsParser};
use product_metrics_scraper::{BatchOrchestrator, ProductScraper};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let config = load_config().await?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();

    let parser = ProductMetricsParser::with_config(&config.parsing.field_selectors)
        .context("Invalid extraction strategies")?;
    let client = HttpClient::new(HttpClientConfig::from_scraper_config(&config.scraper))
        .context("Failed to create HTTP client")?;

    let scraper = Arc::new(ProductScraper::new(
        Arc::new(client),
        Arc::new(parser),
        config.scraper.clone(),
    ));
    let orchestrator = Arc::new(BatchOrchestrator::new(scraper.clone(), config.batch.clone()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    api::serve(listener, AppState::new(scraper, orchestrator), shutdown_signal()).await
}

async fn load_config() -> Result<AppConfig> {
    let manager = match std::env::var(config::env::CONFIG_PATH) {
        Ok(path) => ConfigManager::with_path(path),
        Err(_) => ConfigManager::new()?,
    };

    let mut config = manager.load_config().await?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
