//! Configuration schema.
//!
//! Hierarchy: `Config` → `StreamConfig`, `CliConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.nexus/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub stream: StreamConfig,
    pub cli: CliConfig,
}

// ─────────────────────────────────────────────
// Stream
// ─────────────────────────────────────────────

/// Settings for the streaming session manager.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamConfig {
    /// Base URL of the conversation server.
    pub base_url: String,
    /// How long to wait for response headers before aborting (ms).
    pub connect_timeout_ms: u64,
    /// How long a finished session stays queryable (ms).
    pub grace_period_ms: u64,
    /// Interval of the background sweep of expired sessions (ms).
    /// `0` disables the background sweeper; expiry still applies on access.
    pub sweep_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout_ms: 30_000,
            grace_period_ms: 5_000,
            sweep_interval_ms: 1_000,
        }
    }
}

// ─────────────────────────────────────────────
// CLI
// ─────────────────────────────────────────────

/// Settings for the `nexus` binary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    /// How often `nexus stream` polls for new messages (ms).
    pub poll_interval_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stream.connect_timeout_ms, 30_000);
        assert_eq!(config.stream.grace_period_ms, 5_000);
        assert_eq!(config.stream.sweep_interval_ms, 1_000);
        assert_eq!(config.cli.poll_interval_ms, 100);
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = serde_json::json!({
            "stream": {
                "baseUrl": "http://chat.local:8080",
                "connectTimeoutMs": 1000
            }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.stream.base_url, "http://chat.local:8080");
        assert_eq!(config.stream.connect_timeout_ms, 1000);
        // Defaults preserved for missing fields
        assert_eq!(config.stream.grace_period_ms, 5_000);
        assert_eq!(config.cli.poll_interval_ms, 100);
    }

    #[test]
    fn test_config_serializes_camel_case() {
        let raw = serde_json::to_value(Config::default()).unwrap();
        assert!(raw["stream"].get("gracePeriodMs").is_some());
        assert!(raw["stream"].get("grace_period_ms").is_none());
        assert!(raw["cli"].get("pollIntervalMs").is_some());
    }
}
