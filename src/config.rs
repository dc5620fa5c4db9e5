//! Configuration loading for the sync client.
//!
//! Tunable settings live in `conf/config.toml`; missing or invalid entries
//! fall back to defaults so a reading session can always start. The
//! host-injected book environment ([`BookEnv`]) is separate: without it there
//! is no book to sync, so loading it is a hard error.

use crate::theme::ThemeDef;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// App-level configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Floor between consecutive progress saves, in seconds.
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,
    /// Minimum net horizontal movement for a swipe to register, in pixels.
    #[serde(default = "default_swipe_threshold_px")]
    pub swipe_threshold_px: f32,
    /// Root directory for the per-book cache.
    #[serde(default = "default_cache_root")]
    pub cache_root: String,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            save_interval_secs: default_save_interval_secs(),
            swipe_threshold_px: default_swipe_threshold_px(),
            cache_root: default_cache_root(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }
}

/// Format tag identifying which viewer a position belongs to.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Txt,
    Epub,
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookFormat::Txt => "txt",
            BookFormat::Epub => "epub",
        };
        write!(f, "{}", label)
    }
}

/// Everything the host page injects before a reading session starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookEnv {
    pub server_url: String,
    pub book_id: u64,
    pub format: BookFormat,
    /// Where the text/EPUB content itself is served from.
    pub content_url: String,
    /// Endpoint the bookmark POST goes to.
    pub bookmark_url: String,
    /// Anti-forgery token copied from the page-embedded form field.
    pub csrf_token: String,
    #[serde(default)]
    pub themes: Vec<ThemeDef>,
    /// Previously saved bookmarks to restore; the contract limits this to one.
    #[serde(default)]
    pub bookmarks: Vec<String>,
}

impl BookEnv {
    /// Cache key scoping per-book state such as the location index.
    pub fn book_key(&self) -> String {
        format!("{}-{}", self.book_id, self.format)
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

/// Load the book environment; unlike [`load_config`] there is no usable
/// default, so failures propagate.
pub fn load_book_env(path: &Path) -> Result<BookEnv> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read book environment {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("invalid book environment TOML {}", path.display()))
}

fn default_save_interval_secs() -> u64 {
    30
}

fn default_swipe_threshold_px() -> f32 {
    40.0
}

fn default_cache_root() -> String {
    ".cache".to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
