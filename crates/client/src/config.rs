//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional, with local-development defaults:
//!
//! - `QUITANDA_API_URL` - Base URL of the storefront API
//!   (default: `http://localhost:3000/api`)
//! - `QUITANDA_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds
//!   (default: 30)
//! - `QUITANDA_CREDENTIALS_FILE` - Where to persist session credentials
//!   (default: `.quitanda/credentials.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CREDENTIALS_FILE: &str = ".quitanda/credentials.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront API, without a trailing slash.
    pub api_base_url: Url,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
    /// Path of the persisted credential file.
    pub credentials_path: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if `QUITANDA_API_URL` is not a
    /// valid URL or `QUITANDA_REQUEST_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url =
            std::env::var("QUITANDA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("QUITANDA_API_URL".to_string(), e.to_string()))?;

        let request_timeout = match std::env::var("QUITANDA_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidEnvVar(
                        "QUITANDA_REQUEST_TIMEOUT_SECS".to_string(),
                        format!("not a number: {raw}"),
                    )
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let credentials_path = std::env::var("QUITANDA_CREDENTIALS_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_CREDENTIALS_FILE), PathBuf::from);

        Ok(Self {
            api_base_url,
            request_timeout,
            credentials_path,
        })
    }

    /// Configuration pointing at an explicit base URL, with defaults for the
    /// rest. Mostly useful in tests.
    #[must_use]
    pub fn with_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url() {
        let url = Url::parse("http://127.0.0.1:8080/api").unwrap();
        let config = ClientConfig::with_base_url(url.clone());
        assert_eq!(config.api_base_url, url);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    // Environment mutation is process-global, so everything from_env-related
    // lives in this one test.
    #[test]
    #[allow(unsafe_code)]
    fn test_from_env() {
        unsafe {
            std::env::remove_var("QUITANDA_API_URL");
            std::env::remove_var("QUITANDA_REQUEST_TIMEOUT_SECS");
            std::env::remove_var("QUITANDA_CREDENTIALS_FILE");
        }
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:3000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(
            config.credentials_path,
            PathBuf::from(".quitanda/credentials.json")
        );

        unsafe {
            std::env::set_var("QUITANDA_API_URL", "https://loja.example.com/api/");
            std::env::set_var("QUITANDA_REQUEST_TIMEOUT_SECS", "5");
            std::env::set_var("QUITANDA_CREDENTIALS_FILE", "/tmp/creds.json");
        }
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://loja.example.com/api/");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/creds.json"));

        unsafe {
            std::env::set_var("QUITANDA_REQUEST_TIMEOUT_SECS", "soon");
        }
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == "QUITANDA_REQUEST_TIMEOUT_SECS"
        ));

        unsafe {
            std::env::set_var("QUITANDA_API_URL", "not a url");
            std::env::remove_var("QUITANDA_REQUEST_TIMEOUT_SECS");
        }
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidEnvVar(var, _)) if var == "QUITANDA_API_URL"
        ));

        unsafe {
            std::env::remove_var("QUITANDA_API_URL");
            std::env::remove_var("QUITANDA_CREDENTIALS_FILE");
        }
    }
}
