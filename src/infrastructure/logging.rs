//! Logging system configuration and initialization
//!
//! This module provides the logging setup for the scraper service:
//! - Console output and daily-rolling file output, each optional
//! - Configuration file based log level control, with `RUST_LOG` taking precedence
//! - Structured JSON logging (optional)
//! - UTC timestamps

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Utc;
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

// Re-export LoggingConfig from config module
pub use crate::infrastructure::config::LoggingConfig;

/// Log file prefix; the daily appender adds the date
const LOG_FILE_PREFIX: &str = "product-metrics-scraper.log";

/// Dependencies that are only interesting at trace level
const NOISY_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "h2=warn", "reqwest=info", "tower_http=info"];

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Timestamps in UTC with millisecond precision
struct UtcTimeFormatter;

impl FormatTime for UtcTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Filter for a configured level, with dependency chatter suppressed unless
/// `trace` was asked for
fn level_filter(level: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| anyhow!("Invalid log level {:?}: {}", level, e))?;

    if !level.to_lowercase().contains("trace") {
        for directive in NOISY_TARGETS {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG`, when set, replaces the configured level entirely:
/// ```bash
/// RUST_LOG="debug,reqwest=debug,hyper=debug" product-metrics-scraper
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.console_output && !config.file_output {
        return Err(anyhow!("No logging output configured"));
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut log_dir = None;

    if config.file_output {
        let dir = config.log_directory.clone().unwrap_or_else(get_log_directory);
        std::fs::create_dir_all(&dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", dir, e))?;

        let (file_writer, file_guard) = non_blocking(rolling::daily(&dir, LOG_FILE_PREFIX));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        let file_layer = fmt::Layer::new()
            .with_writer(file_writer)
            .with_timer(UtcTimeFormatter)
            .with_ansi(false);
        layers.push(if config.json_format {
            file_layer
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            file_layer.with_target(false).boxed()
        });
        log_dir = Some(dir);
    }

    if config.console_output {
        let console_layer = fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(UtcTimeFormatter);
        layers.push(if config.json_format {
            console_layer.json().boxed()
        } else {
            console_layer.with_target(false).boxed()
        });
    }

    Registry::default()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    info!("Console output: {}", config.console_output);
    if let Some(dir) = log_dir {
        info!("Log directory: {:?}", dir);
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..Default::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }

    #[test]
    fn test_level_filter() {
        assert!(level_filter("debug").is_ok());
        assert!(level_filter("trace").is_ok());
        assert!(level_filter("info,product_metrics_scraper=debug").is_ok());
        assert!(level_filter("product_metrics_scraper=loud").is_err());
    }

    #[test]
    fn test_log_directory_is_named_logs() {
        assert!(get_log_directory().to_string_lossy().ends_with("logs"));
    }
}
