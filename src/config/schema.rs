//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the LED relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LedConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Subscriber (WebSocket push) settings.
    pub subscribers: SubscriberConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout for plain HTTP requests in seconds.
    /// WebSocket connections are not bound by it once upgraded.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Subscriber registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriberConfig {
    /// Outbound message buffer per subscriber. A full buffer makes the
    /// broadcast wait for room rather than drop the subscriber.
    pub channel_capacity: usize,

    /// How long a broadcast waits on one subscriber's full buffer before
    /// treating that subscriber as stalled and dropping it.
    pub send_timeout_ms: u64,

    /// Upper bound on concurrently registered subscribers.
    /// Upgrades beyond it are refused with 503.
    pub max_subscribers: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
            send_timeout_ms: 1000,
            max_subscribers: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "led_relay=debug,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: LedConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
        assert_eq!(config.subscribers.channel_capacity, 32);
        assert_eq!(config.subscribers.send_timeout_ms, 1000);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: LedConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [subscribers]
            max_subscribers = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
        assert_eq!(config.listener.max_connections, 10_000);
        assert_eq!(config.subscribers.max_subscribers, 4);
        assert_eq!(config.subscribers.channel_capacity, 32);
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
