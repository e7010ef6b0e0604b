use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::providers::deepl::DeepL;

/// Application configuration, loaded from and saved to a JSON file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), empty for auto-detection
    #[serde(default)]
    pub source_language: String,

    /// Target language code (ISO or API variant such as EN-GB)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Request admission and retry settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Write-back settings
    #[serde(default)]
    pub write_back: WriteBackConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation API settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    /// Authentication key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL, empty to pick the tier from the key
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Descriptive context sent with every request
    #[serde(default = "default_context")]
    pub context: String,

    /// Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            context: default_context(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Request admission and retry settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Requests admitted at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Upper bound the admission gate may be widened to
    #[serde(default = "default_burst_capacity")]
    pub burst_capacity: usize,

    /// Retries per text on 429 answers, after the first attempt
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Usage polling interval during a run, 0 disables polling
    #[serde(default = "default_usage_poll_secs")]
    pub usage_poll_secs: u64,

    /// Query usage once before dispatching
    #[serde(default = "default_true")]
    pub check_usage_before_run: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            burst_capacity: default_burst_capacity(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            usage_poll_secs: default_usage_poll_secs(),
            check_usage_before_run: default_true(),
        }
    }
}

/// Write-back settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WriteBackConfig {
    /// Characters the host refuses in names
    #[serde(default = "default_forbidden_characters")]
    pub forbidden_characters: String,

    /// Re-merge family documents into the project after commit
    #[serde(default = "default_true")]
    pub reload_families: bool,
}

impl Default for WriteBackConfig {
    fn default() -> Self {
        Self {
            forbidden_characters: default_forbidden_characters(),
            reload_families: default_true(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_context() -> String {
    crate::translation::client::DEFAULT_CONTEXT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    crate::translation::client::DEFAULT_MAX_CONCURRENT_REQUESTS
}

fn default_burst_capacity() -> usize {
    crate::translation::client::DEFAULT_BURST_CAPACITY
}

fn default_retry_count() -> u32 {
    crate::translation::client::DEFAULT_RETRY_COUNT
}

fn default_retry_backoff_ms() -> u64 {
    crate::translation::client::DEFAULT_RETRY_BACKOFF_MS
}

fn default_usage_poll_secs() -> u64 {
    30
}

fn default_forbidden_characters() -> String {
    crate::translation::updater::DEFAULT_FORBIDDEN_CHARACTERS.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(anyhow!("Translation API key is required"));
        }

        // Validate languages
        if !self.source_language.trim().is_empty() {
            crate::language_utils::validate_language_code(&self.source_language)
                .context("Invalid source language")?;
        }
        crate::language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;

        if !self.api.endpoint.trim().is_empty() {
            url::Url::parse(&self.api.endpoint)
                .with_context(|| format!("Invalid API endpoint: {}", self.api.endpoint))?;
        }

        if self.api.timeout_secs == 0 {
            return Err(anyhow!("API timeout must be at least one second"));
        }

        let dispatch = &self.dispatch;
        if dispatch.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be at least 1"));
        }
        if dispatch.burst_capacity < dispatch.max_concurrent_requests {
            return Err(anyhow!(
                "burst_capacity ({}) must not be below max_concurrent_requests ({})",
                dispatch.burst_capacity,
                dispatch.max_concurrent_requests
            ));
        }
        if dispatch.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }
        if dispatch.retry_backoff_ms == 0 {
            return Err(anyhow!("retry_backoff_ms must be at least 1"));
        }

        Ok(())
    }

    /// Endpoint to use, falling back to the tier implied by the key
    pub fn resolved_endpoint(&self) -> String {
        if self.api.endpoint.trim().is_empty() {
            DeepL::default_endpoint(&self.api.api_key).to_string()
        } else {
            self.api.endpoint.trim_end_matches('/').to_string()
        }
    }

    /// Source language in API spelling, `None` for auto-detection
    pub fn api_source_language(&self) -> Result<Option<String>> {
        if self.source_language.trim().is_empty() {
            return Ok(None);
        }
        // The API only accepts bare codes as source
        let code = crate::language_utils::to_api_language_code(&self.source_language)?;
        Ok(Some(code.split('-').next().unwrap_or(&code).to_string()))
    }

    /// Target language in API spelling
    pub fn api_target_language(&self) -> Result<String> {
        crate::language_utils::to_api_language_code(&self.target_language)
    }

    /// Load the configuration, creating a default file when none exists
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: String::new(),
            target_language: default_target_language(),
            api: ApiConfig::default(),
            dispatch: DispatchConfig::default(),
            write_back: WriteBackConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
