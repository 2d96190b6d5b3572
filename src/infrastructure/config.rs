//! Configuration infrastructure
//!
//! Contains configuration loading and management for the scraper service.
//!
//! Configuration comes from three places, applied in order:
//! 1. Built-in defaults (the `defaults` module)
//! 2. A JSON config file (partial files are fine)
//! 3. Environment overrides for deployment knobs

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

pub use super::parsing::config::{FieldSelectors, ParsingConfig};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP surface binding
    pub server: ServerConfig,

    /// Outbound request settings
    pub scraper: ScraperConfig,

    /// Batch orchestration limits and pacing
    pub batch: BatchConfig,

    /// Field extraction strategy chains
    pub parsing: ParsingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP surface binding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Outbound request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Browser-like user agent sent with every page request
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Redirects followed before a request fails
    pub max_redirects: usize,

    /// Hosts (and their subdomains) page addresses may point at
    pub allowed_domains: Vec<String>,

    /// Page address for a product id; `{id}` is replaced
    pub product_url_template: String,

    /// Optional global request budget underneath batch pacing
    pub max_requests_per_second: Option<u32>,
}

/// Batch orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Largest accepted batch
    pub max_batch_size: usize,

    /// Delay between one item finishing and the next starting
    pub pacing_delay_ms: u64,

    /// Wall-clock budget for a whole batch; unlimited when unset
    pub batch_deadline_ms: Option<u64>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for rolling log files
    pub log_directory: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_redirects: defaults::MAX_REDIRECTS,
            allowed_domains: aliexpress::ALLOWED_DOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            product_url_template: aliexpress::PRODUCT_URL_TEMPLATE.to_string(),
            max_requests_per_second: None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: defaults::MAX_BATCH_SIZE,
            pacing_delay_ms: defaults::PACING_DELAY_MS,
            batch_deadline_ms: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_directory: None,
        }
    }
}

impl AppConfig {
    /// Apply deployment overrides from an environment lookup
    ///
    /// The binary passes `|key| std::env::var(key).ok()`; tests pass a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(env::PORT) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got {:?}", env::PORT, port))?;
        }
        if let Some(host) = lookup(env::HOST) {
            self.server.host = host;
        }
        if let Some(level) = lookup(env::LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(delay) = lookup(env::PACING_DELAY_MS) {
            self.batch.pacing_delay_ms = delay.trim().parse().with_context(|| {
                format!("{} must be milliseconds, got {:?}", env::PACING_DELAY_MS, delay)
            })?;
        }
        if let Some(user_agent) = lookup(env::USER_AGENT) {
            self.scraper.user_agent = user_agent;
        }
        Ok(())
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch.max_batch_size == 0 {
            anyhow::bail!("batch.max_batch_size must be greater than 0");
        }
        if self.scraper.timeout_seconds == 0 {
            anyhow::bail!("scraper.timeout_seconds must be greater than 0");
        }
        if self.scraper.allowed_domains.is_empty() {
            anyhow::bail!("scraper.allowed_domains must list at least one domain");
        }
        if !self.scraper.product_url_template.contains("{id}") {
            anyhow::bail!(
                "scraper.product_url_template must contain {{id}}, got {:?}",
                self.scraper.product_url_template
            );
        }
        Ok(())
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Create a configuration manager for the per-user config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Create a configuration manager for an explicit file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, falling back to defaults if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, using defaults: {:?}", self.config_path);
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        let config = serde_json::from_str::<AppConfig>(&content)
            .with_context(|| format!("Invalid configuration file: {:?}", self.config_path))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// AliExpress marketplace constants
pub mod aliexpress {
    /// Product page address; `{id}` is the numeric product id
    pub const PRODUCT_URL_TEMPLATE: &str = "https://www.aliexpress.us/item/{id}.html";

    /// Marketplace hosts product pages are served from
    pub const ALLOWED_DOMAINS: &[&str] = &["aliexpress.us", "aliexpress.com"];
}

/// Environment variable names
pub mod env {
    pub const CONFIG_PATH: &str = "SCRAPER_CONFIG";
    pub const PORT: &str = "PORT";
    pub const HOST: &str = "HOST";
    pub const LOG_LEVEL: &str = "SCRAPER_LOG_LEVEL";
    pub const PACING_DELAY_MS: &str = "SCRAPER_PACING_DELAY_MS";
    pub const USER_AGENT: &str = "SCRAPER_USER_AGENT";
}

/// Default configuration values
pub mod defaults {
    /// Directory name under the user config dir
    pub const APP_DIR_NAME: &str = "product-metrics-scraper";

    /// Config file name inside `APP_DIR_NAME`
    pub const CONFIG_FILE_NAME: &str = "config.json";

    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 3000;

    /// Desktop Chrome user agent; marketplace pages serve stripped markup to bots
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default redirect limit
    pub const MAX_REDIRECTS: usize = 5;

    /// Default maximum batch size
    pub const MAX_BATCH_SIZE: usize = 10;

    /// Default delay between batch items in milliseconds
    pub const PACING_DELAY_MS: u64 = 2000;

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;
}
