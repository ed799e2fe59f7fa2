//! Configuration schema definitions.
//!
//! This module defines the configuration the host process hands to the
//! communication core. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

use crate::parser::ParserKind;

/// Root configuration for the communication core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Identity of this service, forwarded on every outbound call.
    pub service: ServiceIdentity,

    /// Outbound client settings (timeouts, concurrency caps).
    pub client: ClientConfig,

    /// Peer services this service calls.
    pub downstreams: Vec<DownstreamConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServiceConfig {
    /// Parse a configuration from TOML text without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Find a downstream definition by name.
    pub fn downstream(&self, name: &str) -> Option<&DownstreamConfig> {
        self.downstreams.iter().find(|d| d.name == name)
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceIdentity {
    /// Service name (sent as `X-SERVICE-NAME`).
    pub name: String,

    /// Service version (sent as `X-SERVICE-VERSION`).
    pub version: String,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            version: "Unknown".to_string(),
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Default per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum concurrent outbound calls in total (0 = unbounded).
    pub concurrency_limit: usize,

    /// Maximum concurrent outbound calls per destination host (0 = unbounded).
    pub concurrency_limit_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            connect_timeout_secs: 10,
            concurrency_limit: 0,
            concurrency_limit_per_host: 0,
        }
    }
}

/// A peer service definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownstreamConfig {
    /// Unique downstream identifier for logging/metrics.
    pub name: String,

    /// Base URL every request path is appended to (e.g. "http://users:8080/v1").
    pub host: String,

    /// Payload shape this downstream answers with.
    #[serde(default)]
    pub parser: ParserKind,

    /// Per-downstream timeout override in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.service.name, "Unknown");
        assert_eq!(config.service.version, "Unknown");
        assert_eq!(config.client.timeout_secs, 60);
        assert_eq!(config.client.concurrency_limit, 0);
        assert_eq!(config.client.concurrency_limit_per_host, 0);
        assert!(config.downstreams.is_empty());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [service]
            name = "orders"
            version = "4.2.0"

            [client]
            concurrency_limit = 64

            [[downstreams]]
            name = "users"
            host = "http://users.internal:8080"

            [[downstreams]]
            name = "payments"
            host = "https://payments.internal"
            parser = "http_status"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.service.name, "orders");
        assert_eq!(config.client.concurrency_limit, 64);
        assert_eq!(config.client.timeout_secs, 60);
        assert_eq!(config.downstreams.len(), 2);
        assert_eq!(config.downstream("users").unwrap().parser, ParserKind::Envelope);
        let payments = config.downstream("payments").unwrap();
        assert_eq!(payments.parser, ParserKind::HttpStatus);
        assert_eq!(payments.timeout_secs, Some(5));
        assert!(config.downstream("search").is_none());
    }
}
