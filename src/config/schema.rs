//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::parser::Tag;

/// Root configuration for the replay tool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ReplayConfig {
    /// Destination host (and optional port) receiving replayed traffic.
    /// Normally supplied on the command line.
    pub target: String,

    /// Where the log feed comes from.
    pub source: SourceConfig,

    /// Outbound HTTP client settings.
    pub client: ClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Log feed source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Read the feed from stdin instead of spawning `command`.
    pub stdin: bool,

    /// Log-producing program.
    pub command: String,

    /// Arguments passed to `command`.
    pub args: Vec<String>,

    /// How long to wait for in-flight requests once the feed ends.
    pub drain_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            stdin: false,
            command: "varnishlog".to_string(),
            // -c client traffic, -o group by request, -u unbuffered, -i tag filter
            args: vec![
                "-c".to_string(),
                "-o".to_string(),
                "-u".to_string(),
                "-i".to_string(),
                Tag::varnishlog_filter().to_string(),
            ],
            drain_timeout_secs: 30,
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection establishment timeout in seconds. None leaves the transport default.
    pub connect_timeout_secs: Option<u64>,

    /// Idle pooled connection timeout in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: None,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
