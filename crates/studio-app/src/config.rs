//! Session configuration.

use std::time::Duration;

use studio_client::ClientConfig;

use crate::error::{StudioError, StudioResult};

/// Studio session configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Backend client settings
    pub client: ClientConfig,
    /// Render queue refresh interval
    pub queue_poll_interval: Duration,
    /// Published list refresh interval
    pub published_poll_interval: Duration,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            queue_poll_interval: Duration::from_secs(5),
            published_poll_interval: Duration::from_secs(30),
        }
    }
}

impl StudioConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> StudioResult<Self> {
        let client = ClientConfig::from_env()?;
        let queue_poll_interval = env_interval("STUDIO_QUEUE_POLL_SECS", 5)?;
        let published_poll_interval = env_interval("STUDIO_PUBLISHED_POLL_SECS", 30)?;

        Ok(Self {
            client,
            queue_poll_interval,
            published_poll_interval,
        })
    }
}

fn env_interval(key: &str, default: u64) -> StudioResult<Duration> {
    let secs = std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default);
    if secs == 0 {
        return Err(StudioError::config(format!("{key} must be at least 1")));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("STUDIO_QUEUE_POLL_SECS");
        std::env::remove_var("STUDIO_PUBLISHED_POLL_SECS");
        std::env::remove_var("STUDIO_API_URL");
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();
        let config = StudioConfig::from_env().unwrap();
        assert_eq!(config.queue_poll_interval, Duration::from_secs(5));
        assert_eq!(config.published_poll_interval, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_config_overrides() {
        clear_env();
        std::env::set_var("STUDIO_QUEUE_POLL_SECS", "2");
        std::env::set_var("STUDIO_PUBLISHED_POLL_SECS", "60");
        let config = StudioConfig::from_env().unwrap();
        assert_eq!(config.queue_poll_interval, Duration::from_secs(2));
        assert_eq!(config.published_poll_interval, Duration::from_secs(60));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_interval_rejected() {
        clear_env();
        std::env::set_var("STUDIO_QUEUE_POLL_SECS", "0");
        assert!(matches!(
            StudioConfig::from_env(),
            Err(StudioError::Config(_))
        ));
        clear_env();
    }
}
