use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::{Category, ClientConfig};

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("API token cannot be empty")]
    EmptyToken,

    #[error("Invalid TTL for {0}: must be at least 1 second")]
    InvalidTtl(String),

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid max_concurrent_requests: {0}. Must be at least 1")]
    InvalidMaxConcurrentRequests(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid cache category: {0}. Must be one of: console, scheduled-task, always-on-task, webapp")]
    InvalidCategory(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging from the working directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .anywhere/config.yaml
    /// 3. .anywhere/local.yaml (optional local overrides)
    /// 4. Environment variables (ANYWHERE_* prefix, `__` separates nested keys)
    pub fn load() -> Result<ClientConfig> {
        Self::load_from_dir(".")
    }

    /// Same as [`ConfigLoader::load`] with the `.anywhere/` directory resolved under `root`
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<ClientConfig> {
        let dir = root.as_ref().join(".anywhere");
        let config: ClientConfig = Figment::new()
            .merge(Serialized::defaults(ClientConfig::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("ANYWHERE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<ClientConfig> {
        let config: ClientConfig = Figment::new()
            .merge(Serialized::defaults(ClientConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
        if config.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }

        if config.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        if config.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.timeout_secs));
        }

        if config.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidMaxConcurrentRequests(
                config.max_concurrent_requests,
            ));
        }

        let cache = &config.cache;
        if cache.default_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl("default".to_string()));
        }

        for (name, secs) in &cache.ttl_overrides {
            if name.parse::<Category>().is_err() {
                return Err(ConfigError::InvalidCategory(name.clone()));
            }
            if *secs == 0 {
                return Err(ConfigError::InvalidTtl(name.clone()));
            }
        }

        if let Some(name) = cache
            .disabled_categories
            .iter()
            .find(|name| name.parse::<Category>().is_err())
        {
            return Err(ConfigError::InvalidCategory(name.clone()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{LogFormat, Region};
    use std::fs;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::{NamedTempFile, TempDir};

    fn valid() -> ClientConfig {
        ClientConfig::new("alice", "secret-token")
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_concurrent_requests, 10);
        assert_eq!(config.cache.default_ttl_secs, 30);
        assert!(config.cache.enabled);
        assert!(config.limiter.enabled);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyUsername)
        );
        ConfigLoader::validate(&valid()).expect("credentials are all a config needs");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
username: alice
token: abc123
region: eu
timeout_secs: 5
cache:
  default_ttl_secs: 10
  ttl_overrides:
    webapp: 120
  disabled_categories:
    - always-on-task
limiter:
  exempt_routes:
    - /api/v0/user/alice/cpu/
logging:
  level: debug
  format: json
";

        let config: ClientConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.region, Region::Eu);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.cache.ttl_for(Category::WebApp), Duration::from_secs(120));
        assert_eq!(config.cache.ttl_for(Category::Console), Duration::from_secs(10));
        assert_eq!(config.cache.disabled_categories, vec!["always-on-task"]);
        assert_eq!(config.limiter.exempt_routes.len(), 1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.max_concurrent_requests, 10);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_empty_token() {
        let config = ClientConfig::new("alice", "  ");
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::EmptyToken));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = valid();
        config.cache.default_ttl_secs = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTtl("default".to_string()))
        );

        let mut config = valid();
        config.cache.ttl_overrides.insert("console".to_string(), 0);
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTtl("console".to_string()))
        );
    }

    #[test]
    fn test_validate_unknown_category() {
        let mut config = valid();
        config.cache.ttl_overrides.insert("files".to_string(), 10);
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidCategory("files".to_string()))
        );

        let mut config = valid();
        config.cache.disabled_categories.push("students".to_string());
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidCategory("students".to_string()))
        );
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = valid();
        config.max_concurrent_requests = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConcurrentRequests(0))
        );
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = valid();
        config.timeout_secs = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout(0))
        );
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = valid();
        config.logging.level = "verbose".to_string();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogLevel("verbose".to_string()));
        assert!(err.to_string().contains("trace, debug, info, warn, error"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "username: alice\ntoken: abc\ncache:\n  enabled: false").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.username, "alice");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.default_ttl_secs, 30);
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "username: alice").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::EmptyToken)
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(".anywhere");
        fs::create_dir(&dir).unwrap();
        fs::write(
            dir.join("config.yaml"),
            "username: alice\ntoken: abc\ntimeout_secs: 5\nlogging:\n  level: info\n  format: json\n",
        )
        .unwrap();
        fs::write(dir.join("local.yaml"), "timeout_secs: 15\nlogging:\n  level: debug\n").unwrap();

        temp_env::with_vars(
            [
                ("ANYWHERE_TIMEOUT_SECS", None::<&str>),
                ("ANYWHERE_LOGGING__LEVEL", None),
            ],
            || {
                let config = ConfigLoader::load_from_dir(root.path()).unwrap();
                assert_eq!(config.timeout_secs, 15, "Local overrides should win");
                assert_eq!(config.logging.level, "debug");
                assert_eq!(
                    config.logging.format,
                    LogFormat::Json,
                    "Base value should persist when not overridden"
                );
            },
        );
    }

    #[test]
    fn test_env_override() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(".anywhere");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("config.yaml"), "username: alice\ntoken: abc\n").unwrap();

        temp_env::with_vars(
            [
                ("ANYWHERE_USERNAME", Some("bob")),
                ("ANYWHERE_CACHE__DEFAULT_TTL_SECS", Some("90")),
                ("ANYWHERE_LIMITER__ENABLED", Some("false")),
            ],
            || {
                let config = ConfigLoader::load_from_dir(root.path()).unwrap();
                assert_eq!(config.username, "bob");
                assert_eq!(config.token, "abc");
                assert_eq!(config.cache.default_ttl_secs, 90);
                assert!(!config.limiter.enabled);
            },
        );
    }
}
