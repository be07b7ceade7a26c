use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::Category;

/// Main configuration structure for a client session
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Account username
    #[serde(default)]
    pub username: String,

    /// API token (sent as `Authorization: Token <token>`)
    #[serde(default)]
    pub token: String,

    /// Which regional API host to talk to
    #[serde(default)]
    pub region: Region,

    /// Overrides the regional host (tests, proxies)
    #[serde(default)]
    pub base_url_override: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of requests in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Entity cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Route limiter configuration
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_concurrent_requests() -> usize {
    10
}

impl ClientConfig {
    /// Convenience constructor with defaults for everything but credentials
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// Host every API path is appended to
    pub fn base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or_else(|| self.region.base_url())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            token: String::new(),
            region: Region::default(),
            base_url_override: None,
            timeout_secs: default_timeout_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
            cache: CacheConfig::default(),
            limiter: LimiterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .field("region", &self.region)
            .field("base_url_override", &self.base_url_override)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("cache", &self.cache)
            .field("limiter", &self.limiter)
            .field("logging", &self.logging)
            .finish()
    }
}

/// Regional API host. European accounts live on a separate host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// `www.pythonanywhere.com`
    #[default]
    Us,
    /// `eu.pythonanywhere.com`
    Eu,
}

impl Region {
    /// Base URL for this region
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Us => "https://www.pythonanywhere.com",
            Self::Eu => "https://eu.pythonanywhere.com",
        }
    }
}

/// Entity cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Master switch for caching
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// TTL applied to categories without an override, in seconds
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Per-category TTL overrides, keyed by category name
    #[serde(default)]
    pub ttl_overrides: BTreeMap<String, u64>,

    /// Categories that start with caching disabled
    #[serde(default)]
    pub disabled_categories: Vec<String>,
}

const fn default_true() -> bool {
    true
}

const fn default_ttl_secs() -> u64 {
    30
}

impl CacheConfig {
    /// TTL for one category, honoring overrides
    pub fn ttl_for(&self, category: Category) -> Duration {
        let secs = self
            .ttl_overrides
            .get(category.as_str())
            .copied()
            .unwrap_or(self.default_ttl_secs);
        Duration::from_secs(secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: default_ttl_secs(),
            ttl_overrides: BTreeMap::new(),
            disabled_categories: vec![],
        }
    }
}

/// Route limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LimiterConfig {
    /// Master switch for pre-flight admission checks
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Request paths that bypass admission checks
    #[serde(default)]
    pub exempt_routes: Vec<String>,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exempt_routes: vec![],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Stdout format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rotated JSON log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Enable stdout logging
    #[serde(default = "default_true")]
    pub enable_stdout: bool,

    /// Rotation policy for file output
    #[serde(default)]
    pub rotation: RotationPolicy,

    /// Number of rotated log files kept on disk
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

const fn default_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            enable_stdout: true,
            rotation: RotationPolicy::default(),
            retention_days: default_retention_days(),
        }
    }
}

/// Stdout log format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line human-readable output
    #[default]
    Pretty,
}

/// Log file rotation policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file every day
    #[default]
    Daily,
    /// New file every hour
    Hourly,
    /// Single file
    Never,
}
