//! Config loader — `~/.nexus/config.json` plus env var overrides.
//!
//! Precedence, lowest first: `Config::default()`, the JSON file, then
//! `NEXUS_<SECTION>__<FIELD>` environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::schema::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration and apply env overrides.
///
/// Never fails: a missing file means defaults, an unreadable or invalid one
/// is logged and replaced by defaults.
pub fn load_config(path: Option<&Path>) -> Config {
    let path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&path))
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!(path = %path.display(), "No config file, using defaults");
        return Config::default();
    }
    read_config(path).unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring config file");
        Config::default()
    })
}

/// Parse the config file at `path`, without env overrides.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "Reading config");
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `config` as pretty camelCase JSON, creating parent directories.
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<(), ConfigError> {
    let path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    let io_err = |source| ConfigError::Io {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_vec_pretty(config).map_err(|source| ConfigError::Json {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, json).map_err(io_err)?;

    debug!(path = %path.display(), "Config saved");
    Ok(())
}

/// Numeric overrides: env var and the field it sets.
const MILLIS_OVERRIDES: [(&str, fn(&mut Config) -> &mut u64); 4] = [
    ("NEXUS_STREAM__CONNECT_TIMEOUT_MS", |c| &mut c.stream.connect_timeout_ms),
    ("NEXUS_STREAM__GRACE_PERIOD_MS", |c| &mut c.stream.grace_period_ms),
    ("NEXUS_STREAM__SWEEP_INTERVAL_MS", |c| &mut c.stream.sweep_interval_ms),
    ("NEXUS_CLI__POLL_INTERVAL_MS", |c| &mut c.cli.poll_interval_ms),
];

/// Apply `NEXUS_STREAM__BASE_URL` and the numeric overrides above.
///
/// Values that don't parse as an integer are logged and skipped.
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(url) = std::env::var("NEXUS_STREAM__BASE_URL") {
        config.stream.base_url = url;
    }
    for (var, field) in MILLIS_OVERRIDES {
        let Ok(raw) = std::env::var(var) else {
            continue;
        };
        match raw.parse::<u64>() {
            Ok(ms) => *field(&mut config) = ms,
            Err(_) => warn!(var, value = %raw, "Ignoring non-numeric env override"),
        }
    }
    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.stream.grace_period_ms, 5_000);
        assert_eq!(config.cli.poll_interval_ms, 100);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "stream": {
                "baseUrl": "http://10.0.0.2:5000",
                "gracePeriodMs": 250
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.stream.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.stream.grace_period_ms, 250);
        // Default preserved
        assert_eq!(config.stream.connect_timeout_ms, 30_000);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.stream.connect_timeout_ms, 30_000);
    }

    #[test]
    fn test_read_config_reports_bad_json() {
        let file = write_temp_json("not valid json {{{");
        let err = read_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }), "{err}");
    }

    #[test]
    fn test_read_config_reports_missing_file() {
        let err = read_config(Path::new("/nonexistent/path/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err}");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let file = write_temp_json(r#"{"apiBaseUrl": "http://legacy:5000"}"#);
        let config = read_config(file.path()).unwrap();
        assert_eq!(config.stream.base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn test_load_wrong_types_returns_defaults() {
        let file = write_temp_json(r#"{"stream": {"gracePeriodMs": "soon"}}"#);
        let config = load_config_from_path(file.path());
        assert_eq!(config.stream.grace_period_ms, 5_000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.stream.connect_timeout_ms = 1234;
        config.cli.poll_interval_ms = 50;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.stream.connect_timeout_ms, 1234);
        assert_eq!(reloaded.cli.poll_interval_ms, 50);
    }

    #[test]
    fn test_env_override_connect_timeout() {
        std::env::set_var("NEXUS_STREAM__CONNECT_TIMEOUT_MS", "750");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.stream.connect_timeout_ms, 750);
        std::env::remove_var("NEXUS_STREAM__CONNECT_TIMEOUT_MS");
    }

    #[test]
    fn test_env_override_invalid_number_ignored() {
        std::env::set_var("NEXUS_CLI__POLL_INTERVAL_MS", "fast");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.cli.poll_interval_ms, 100);
        std::env::remove_var("NEXUS_CLI__POLL_INTERVAL_MS");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["stream"].get("connectTimeoutMs").is_some());
        assert!(raw["stream"].get("connect_timeout_ms").is_none());
    }
}
