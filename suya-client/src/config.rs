//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Reconnect defaults (see [`crate::channel::EventChannelClient`])
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Configuration for connecting to the ordering backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL (e.g. "https://api.suya.example")
    pub base_url: String,

    /// Event channel TCP address (e.g. "api.suya.example:9020")
    pub channel_addr: Option<String>,

    /// TLS server name for the event channel; `None` connects in
    /// plain TCP (local development)
    pub channel_tls_domain: Option<String>,

    /// Bearer token for authenticated (admin/rider) surfaces
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Directory for durable local state (cart, profile, pending order)
    pub data_dir: PathBuf,

    /// Rider geolocation sampling interval
    pub sample_interval: Duration,

    /// Delay between channel reconnect attempts
    pub reconnect_delay: Duration,

    /// Reconnect attempts before the channel gives up
    pub max_reconnect_attempts: u32,
}

impl ClientConfig {
    /// Create a new configuration with defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            channel_addr: None,
            channel_tls_domain: None,
            token: None,
            timeout: 30,
            data_dir: PathBuf::from(".suya"),
            sample_interval: Duration::from_secs(10),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }

    /// Set the event channel address (plain TCP).
    pub fn with_channel_addr(mut self, addr: impl Into<String>) -> Self {
        self.channel_addr = Some(addr.into());
        self
    }

    /// Set the event channel address with TLS.
    pub fn with_channel_tls(
        mut self,
        addr: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        self.channel_addr = Some(addr.into());
        self.channel_tls_domain = Some(domain.into());
        self
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the durable state directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the rider location sampling interval.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Set the reconnect policy.
    pub fn with_reconnect(mut self, attempts: u32, delay: Duration) -> Self {
        self.max_reconnect_attempts = attempts;
        self.reconnect_delay = delay;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://api.example.com")
            .with_channel_tls("api.example.com:9020", "api.example.com")
            .with_timeout(10);

        assert_eq!(config.timeout, 10);
        assert_eq!(config.channel_addr.as_deref(), Some("api.example.com:9020"));
        assert_eq!(config.channel_tls_domain.as_deref(), Some("api.example.com"));
        assert_eq!(config.max_reconnect_attempts, DEFAULT_MAX_RECONNECT_ATTEMPTS);
    }
}
