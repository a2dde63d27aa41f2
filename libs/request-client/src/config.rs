//! Client configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://remediar-api.mgioqc.easypanel.host";
pub const DEFAULT_SORT: &str = "dataHoraUltimaAtualizacao,desc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for `/usuarios/{id}` lookups. Falls back to `api_base_url`.
    #[serde(default)]
    pub profile_base_url: Option<String>,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_sort")]
    pub sort: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_page_size() -> u32 {
    10
}

fn default_sort() -> String {
    DEFAULT_SORT.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            profile_base_url: None,
            timeout_seconds: default_timeout_seconds(),
            page_size: default_page_size(),
            sort: default_sort(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config("api_base_url must not be empty".into()));
        }
        if matches!(&self.profile_base_url, Some(url) if url.trim().is_empty()) {
            return Err(Error::Config("profile_base_url must not be empty when set".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Config("timeout_seconds must be greater than 0".into()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn profile_base(&self) -> &str {
        self.profile_base_url
            .as_deref()
            .unwrap_or(&self.api_base_url)
            .trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.sort, "dataHoraUltimaAtualizacao,desc");
        assert_eq!(config.profile_base(), DEFAULT_API_BASE_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{ "api_base_url": "http://localhost:8080/", "profile_base_url": "http://localhost:8081" }"#,
        )
        .unwrap();
        assert_eq!(config.api_base(), "http://localhost:8080");
        assert_eq!(config.profile_base(), "http://localhost:8081");
        assert_eq!(config.timeout_seconds, 10);
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut config = ClientConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.timeout_seconds = 10;
        config.page_size = 0;
        assert!(config.validate().is_err());

        config.page_size = 10;
        config.api_base_url = "  ".into();
        assert!(config.validate().is_err());
    }
}
