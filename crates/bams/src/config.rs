//! Configuration management for bams.
//!
//! Deployment configuration (where the database lives, which remote endpoints
//! to call) is loaded with figment from TOML files, environment variables,
//! and defaults. Operator-tunable dashboard settings live in
//! [`crate::settings`] instead, persisted in the local store.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "bams";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "bams.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BAMS_`)
/// 2. TOML config file at `~/.config/bams/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local store configuration.
    pub storage: StorageConfig,
    /// Remote gateway configuration.
    pub api: ApiConfig,
    /// Known monitoring devices.
    pub devices: DevicesConfig,
}

/// Local store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/bams/bams.db`
    pub database_path: Option<PathBuf>,
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Skip the network entirely and accept every mutation locally.
    pub offline: bool,
    /// Login endpoint.
    pub login_url: String,
    /// Reading update endpoint.
    pub update_url: String,
    /// Reading delete endpoint.
    pub delete_url: String,
    /// Reading listing endpoint.
    pub data_url: String,
    /// Route requests through a development proxy.
    pub proxy_enabled: bool,
    /// Base URL of the development proxy.
    pub proxy_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Known monitoring devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// Device identifiers shown in history listings.
    pub ids: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            offline: false,
            login_url: "https://9l5vu3c1zl.execute-api.ap-southeast-1.amazonaws.com/prod/login"
                .to_string(),
            update_url:
                "https://mxt1hpstz6.execute-api.ap-southeast-1.amazonaws.com/prod/update-data"
                    .to_string(),
            delete_url:
                "https://mxt1hpstz6.execute-api.ap-southeast-1.amazonaws.com/prod/delete-data"
                    .to_string(),
            data_url: "https://9l5vu3c1zl.execute-api.ap-southeast-1.amazonaws.com/prod/data"
                .to_string(),
            proxy_enabled: false,
            proxy_url: None,
            timeout_secs: 30,
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            ids: vec!["RSU1".to_string(), "RSU2".to_string(), "RSU3".to_string()],
        }
    }
}

impl ApiConfig {
    /// Point every endpoint at `base`, using the standard path layout.
    ///
    /// Used by tests and by deployments that front all endpoints with one host.
    #[must_use]
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            login_url: format!("{base}/login"),
            update_url: format!("{base}/update-data"),
            delete_url: format!("{base}/delete-data"),
            data_url: format!("{base}/data"),
            ..Self::default()
        }
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("BAMS_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let endpoints = [
            ("login_url", &self.api.login_url),
            ("update_url", &self.api.update_url),
            ("delete_url", &self.api.delete_url),
            ("data_url", &self.api.data_url),
        ];
        for (name, url) in endpoints {
            if url.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("api.{name} must not be empty"),
                });
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::ConfigValidation {
                    message: format!("api.{name} must be an http(s) URL: {url}"),
                });
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "api.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.api.proxy_enabled
            && self
                .api
                .proxy_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "api.proxy_url is required when api.proxy_enabled is set".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(!config.api.offline);
        assert!(!config.api.proxy_enabled);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.devices.ids, vec!["RSU1", "RSU2", "RSU3"]);
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn test_default_endpoints_are_https() {
        let api = ApiConfig::default();
        assert!(api.login_url.ends_with("/login"));
        assert!(api.update_url.ends_with("/update-data"));
        assert!(api.delete_url.ends_with("/delete-data"));
        assert!(api.data_url.ends_with("/data"));
        assert!(api.data_url.starts_with("https://"));
    }

    #[test]
    fn test_with_base_url() {
        let api = ApiConfig::with_base_url("http://127.0.0.1:8080/");
        assert_eq!(api.login_url, "http://127.0.0.1:8080/login");
        assert_eq!(api.update_url, "http://127.0.0.1:8080/update-data");
        assert_eq!(api.delete_url, "http://127.0.0.1:8080/delete-data");
        assert_eq!(api.data_url, "http://127.0.0.1:8080/data");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_endpoint() {
        let mut config = Config::default();
        config.api.update_url = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("update_url"));
    }

    #[test]
    fn test_validate_non_http_endpoint() {
        let mut config = Config::default();
        config.api.data_url = "ftp://example.com/data".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("http(s)"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_proxy_without_url() {
        let mut config = Config::default();
        config.api.proxy_enabled = true;
        assert!(config.validate().is_err());

        config.api.proxy_url = Some("http://localhost:3000".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_duration() {
        let api = ApiConfig::default();
        assert_eq!(api.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("bams.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("bams"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
offline = true
timeout_secs = 5

[devices]
ids = ["RMU1", "OBU"]
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert!(config.api.offline);
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.devices.ids, vec!["RMU1", "OBU"]);
        assert_eq!(config.api.login_url, ApiConfig::default().login_url);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\ntimeout_secs = 0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_api_config_deserialize_partial() {
        let json = r#"{"offline": true}"#;
        let api: ApiConfig = serde_json::from_str(json).unwrap();
        assert!(api.offline);
        assert_eq!(api.timeout_secs, 30);
    }
}
