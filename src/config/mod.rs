// Runtime configuration.
// Defaults, optional JSON config file and the base URL environment override.

pub mod paths;

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PostcacheError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Environment variable overriding `api_base_url`.
pub const BASE_URL_ENV: &str = "POSTCACHE_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// `_limit` for the posts list.
    pub posts_limit: u32,
    /// `_limit` for album photos.
    pub photos_limit: u32,
    /// Polling interval and staleness threshold for cached data.
    pub refresh_interval_secs: u64,
    /// Revalidate cached data when the terminal regains focus.
    pub revalidate_on_focus: bool,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            posts_limit: 5,
            photos_limit: 10,
            refresh_interval_secs: 5 * 60,
            revalidate_on_focus: false,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load from the platform config file (if any) and the environment.
    pub fn load() -> Result<Self> {
        let mut config = match paths::config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(PostcacheError::Config("api_base_url is empty".to_string()));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(PostcacheError::Config(format!(
                "api_base_url must be an http(s) URL: {}",
                self.api_base_url
            )));
        }
        if self.posts_limit == 0 || self.photos_limit == 0 {
            return Err(PostcacheError::Config(
                "posts_limit and photos_limit must be positive".to_string(),
            ));
        }
        if self.refresh_interval_secs == 0 {
            return Err(PostcacheError::Config(
                "refresh_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
        assert!(!config.revalidate_on_focus);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"posts_limit": 8, "revalidate_on_focus": true}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.posts_limit, 8);
        assert!(config.revalidate_on_focus);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(PostcacheError::Json(_))
        ));
    }

    #[test]
    fn test_base_url_override() {
        let mut config = Config::default();
        config.apply_base_url_override(Some("  ".to_string()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);

        config.apply_base_url_override(Some("http://localhost:3000".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:3000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_interval = Config {
            refresh_interval_secs: 0,
            ..Config::default()
        };
        assert!(zero_interval.validate().is_err());

        let bad_url = Config {
            api_base_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(bad_url.validate().is_err());

        let zero_limit = Config {
            posts_limit: 0,
            ..Config::default()
        };
        assert!(zero_limit.validate().is_err());
    }
}
