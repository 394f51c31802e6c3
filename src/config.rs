//! Gateway configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the gateway process
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP surface binds to
    pub bind: SocketAddr,

    /// Timeout for discovery's descriptor fetch
    pub discovery_timeout: Duration,
}

impl GatewayConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            bind: ([0, 0, 0, 0], 7410).into(),
            discovery_timeout: Duration::from_secs(10),
        }
    }

    /// Set the bind address
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Set the discovery fetch timeout
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Build a configuration from `NEXUS_GATEWAY_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Some(bind) = std::env::var("NEXUS_GATEWAY_BIND")
            .ok()
            .and_then(|value| value.parse().ok())
        {
            config.bind = bind;
        }

        if let Some(secs) = std::env::var("NEXUS_GATEWAY_DISCOVERY_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
        {
            config.discovery_timeout = Duration::from_secs(secs);
        }

        config
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}
