//! Daemon settings schema.
//!
//! These are the service's own settings, not the INI document it serves.
//! All types derive Serde traits for deserialization from a TOML file.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_BUCKET_COUNT;

/// Root settings for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// INI file served by the daemon.
    pub config_path: PathBuf,

    /// Hash bucket count of the configuration table.
    pub bucket_count: usize,

    /// What a reload does with keys that vanished from the file.
    pub reload_mode: ReloadMode,

    /// Bus identity and dispatch loop settings.
    pub bus: BusConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// HTTP gateway onto the bus.
    pub gateway: GatewayConfig,

    /// Prometheus exporter.
    pub metrics: MetricsConfig,

    /// Reload when the INI file changes on disk.
    pub watch: WatchConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/etc/example/daemon.conf"),
            bucket_count: DEFAULT_BUCKET_COUNT,
            reload_mode: ReloadMode::default(),
            bus: BusConfig::default(),
            logging: LoggingConfig::default(),
            gateway: GatewayConfig::default(),
            metrics: MetricsConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

/// Reload semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadMode {
    /// Update and insert; keys removed from the file survive.
    #[default]
    Merge,
    /// Rebuild from scratch; keys removed from the file disappear.
    Replace,
}

/// Bus settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Well-known name requested on the bus.
    pub service_name: String,

    /// Object path the service answers on.
    pub object_path: String,

    /// Bounded wait of the dispatch loop, in milliseconds.
    pub poll_timeout_ms: u64,

    /// Pending-call queue depth.
    pub queue_depth: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            service_name: "com.redhat.SystemService".to_string(),
            object_path: "/com/redhat/SystemService".to_string(),
            poll_timeout_ms: 1000,
            queue_depth: 64,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,

    /// JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sysconf_daemon=info,sysconf=info".to_string(),
            json: false,
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:8781").
    pub bind_address: String,

    /// Bearer key required on every call; open when unset.
    pub api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8781".to_string(),
            api_key: None,
        }
    }
}

/// Metrics settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9781".to_string(),
        }
    }
}

/// File watch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: DaemonConfig = toml::from_str(
            r#"
            config_path = "/tmp/demo.conf"
            reload_mode = "replace"

            [bus]
            poll_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.config_path, PathBuf::from("/tmp/demo.conf"));
        assert_eq!(config.reload_mode, ReloadMode::Replace);
        assert_eq!(config.bus.poll_timeout_ms, 250);
        assert_eq!(config.bus.service_name, "com.redhat.SystemService");
        assert_eq!(config.bucket_count, DEFAULT_BUCKET_COUNT);
        assert!(!config.gateway.enabled);
    }

    #[test]
    fn unknown_reload_mode_rejected() {
        let result: Result<DaemonConfig, _> = toml::from_str(r#"reload_mode = "append""#);
        assert!(result.is_err());
    }
}
