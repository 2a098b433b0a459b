//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::retry::RetryConfig;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Studio backend client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,
    /// Timeout for ordinary requests
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Timeout for file uploads
    pub upload_timeout: Duration,
    /// Retry policy for idempotent reads
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            upload_timeout: Duration::from_secs(600),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Config for a specific backend with default timeouts.
    pub fn with_base_url(base_url: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(&base_url.into())?,
            ..Self::default()
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("STUDIO_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            timeout: env_secs("STUDIO_REQUEST_TIMEOUT_SECS", 30),
            connect_timeout: env_secs("STUDIO_CONNECT_TIMEOUT_SECS", 5),
            upload_timeout: env_secs("STUDIO_UPLOAD_TIMEOUT_SECS", 600),
            retry: RetryConfig::from_env(),
        })
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::Config(format!("invalid STUDIO_API_URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "unsupported scheme in STUDIO_API_URL: {}",
            url.scheme()
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "STUDIO_API_URL",
            "STUDIO_REQUEST_TIMEOUT_SECS",
            "STUDIO_CONNECT_TIMEOUT_SECS",
            "STUDIO_UPLOAD_TIMEOUT_SECS",
            "STUDIO_RETRY_BASE_MS",
            "STUDIO_RETRY_MAX_MS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_default_values() {
        clear_env();
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.upload_timeout, Duration::from_secs(600));
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    #[serial]
    fn test_config_parses_env_vars() {
        clear_env();
        std::env::set_var("STUDIO_API_URL", "https://studio.example.com/");
        std::env::set_var("STUDIO_CONNECT_TIMEOUT_SECS", "15");
        std::env::set_var("STUDIO_RETRY_BASE_MS", "50");
        std::env::set_var("STUDIO_RETRY_MAX_MS", "2000");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://studio.example.com");
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert_eq!(config.retry.base_delay_ms, 50);
        assert_eq!(config.retry.max_delay_ms, 2000);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_handles_invalid_numbers() {
        clear_env();
        std::env::set_var("STUDIO_REQUEST_TIMEOUT_SECS", "not-a-number");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_rejects_bad_url() {
        clear_env();
        std::env::set_var("STUDIO_API_URL", "ftp://studio.example.com");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ClientError::Config(_))
        ));
        std::env::set_var("STUDIO_API_URL", "not a url");
        assert!(ClientConfig::from_env().is_err());
        clear_env();
    }
}
