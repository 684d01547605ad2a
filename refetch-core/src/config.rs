//! Configuration loading for REFETCH.
//!
//! Every field has a default so a partial file (or no file at all) is
//! usable. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "REFETCH_CONFIG";

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "REFETCH_API_URL";

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL every request path is appended to. Read once at startup.
    pub api_base_url: String,
    /// Per-request timeout applied by the transport.
    pub request_timeout_ms: u64,
    /// Log output format for the binary.
    pub log_format: LogFormat,
    /// Cache store settings.
    pub cache: CacheSettings,
    /// Fetch controller defaults.
    pub fetch: FetchSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000/api".to_string(),
            request_timeout_ms: 10_000,
            log_format: LogFormat::Text,
            cache: CacheSettings::default(),
            fetch: FetchSettings::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Cache store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Lifetime of a cached response (default: 5 minutes).
    pub ttl_ms: u64,
    /// How often expired entries are swept (default: 1 minute).
    pub sweep_interval_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: 5 * 60 * 1000,
            sweep_interval_ms: 60 * 1000,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Defaults for fetch controller bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    /// Age after which a binding's data counts as stale (default: 1 minute).
    pub stale_time_ms: u64,
    /// Background revalidation interval (default: 30 seconds).
    pub background_interval_ms: u64,
    /// Whether bindings revalidate in the background by default.
    pub background_refresh: bool,
    /// Keep showing the last good data when a foreground fetch fails.
    pub keep_data_on_error: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            stale_time_ms: 60 * 1000,
            background_interval_ms: 30 * 1000,
            background_refresh: true,
            keep_data_on_error: false,
        }
    }
}

impl FetchSettings {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn background_interval(&self) -> Duration {
        Duration::from_millis(self.background_interval_ms)
    }
}

impl ClientConfig {
    /// Load from an explicit path, falling back to `REFETCH_CONFIG`, then to
    /// defaults. Environment overrides are applied and the result validated.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match path.or_else(config_path_from_env) {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `REFETCH_API_URL` if it is set.
    pub fn apply_env_overrides(&mut self) {
        self.override_api_base_url(std::env::var(API_URL_ENV).ok());
    }

    /// Replace the base URL when `url` is a non-blank value.
    pub fn override_api_base_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.ttl_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.sweep_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.fetch.stale_time_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.stale_time_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.fetch.background_refresh && self.fetch.background_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.background_interval_ms",
                reason: "must be > 0 when background_refresh is enabled".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.fetch.stale_time(), Duration::from_secs(60));
        assert_eq!(config.fetch.background_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_deserializes_empty() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_config_deserializes_partial() {
        let toml = r#"
            api_base_url = "https://news.example.com/api"
            log_format = "json"

            [cache]
            ttl_ms = 5000
        "#;
        let config = ClientConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.api_base_url, "https://news.example.com/api");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.cache.ttl_ms, 5000);
        assert_eq!(config.cache.sweep_interval_ms, 60_000);
        assert!(config.fetch.background_refresh);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ClientConfig::from_toml_str("api_base = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.api_base_url = "   ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "api_base_url", .. })
        ));

        let mut config = ClientConfig::default();
        config.api_base_url = "/api".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.cache.ttl_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "cache.ttl_ms", .. })
        ));

        let mut config = ClientConfig::default();
        config.fetch.background_interval_ms = 0;
        assert!(config.validate().is_err());
        config.fetch.background_refresh = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_override_api_base_url() {
        let mut config = ClientConfig::default();
        config.override_api_base_url(Some("  ".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:4000/api");

        config.override_api_base_url(Some("https://staging.example.com/api".to_string()));
        assert_eq!(config.api_base_url, "https://staging.example.com/api");

        config.override_api_base_url(None);
        assert_eq!(config.api_base_url, "https://staging.example.com/api");
    }

    #[test]
    fn test_from_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("refetch.toml");
        std::fs::write(&path, "request_timeout_ms = 2500\n").unwrap();

        let config = ClientConfig::from_path(&path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));

        let missing = temp.path().join("missing.toml");
        assert!(matches!(
            ClientConfig::from_path(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
