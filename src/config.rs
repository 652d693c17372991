use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::collector::FailurePolicy;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub interval_ms: u64,
    pub on_error: FailurePolicy,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            interval_ms: 10_000,
            on_error: FailurePolicy::Continue,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Delete the database at startup, discarding all prior history.
    pub reset_on_start: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: default_store_path(),
            reset_on_start: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// How often the dashboard re-reads the store.
    pub refresh_ms: u64,
    /// `dark` or `mono`.
    pub theme: String,
    /// Where the dashboard writes its logs while it owns the terminal.
    pub log_file: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            refresh_ms: 2_000,
            theme: "dark".to_string(),
            log_file: data_dir().join("dashboard.log"),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("metrik"))
        .unwrap_or_default()
}

pub fn default_store_path() -> PathBuf {
    data_dir().join("metrik.db")
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("metrik").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.interval_ms, 10_000);
        assert_eq!(config.general.on_error, FailurePolicy::Continue);
        assert!(config.store.reset_on_start);
        assert!(config.store.path.ends_with("metrik.db"));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.dashboard.refresh_ms, 2_000);
        assert_eq!(config.dashboard.theme, "dark");
        assert!(config.dashboard.log_file.ends_with("dashboard.log"));
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[general]
interval_ms = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.interval_ms, 500);
        // Other fields should be defaults
        assert!(config.store.reset_on_start);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[general]
interval_ms = 1000
on_error = "abort"

[store]
path = "/var/lib/metrik/trik.db"
reset_on_start = false

[logging]
level = "debug"
json = true

[dashboard]
refresh_ms = 500
theme = "mono"
log_file = "/tmp/metrik-dashboard.log"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.interval_ms, 1000);
        assert_eq!(config.general.on_error, FailurePolicy::Abort);
        assert_eq!(config.store.path, PathBuf::from("/var/lib/metrik/trik.db"));
        assert!(!config.store.reset_on_start);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.dashboard.refresh_ms, 500);
        assert_eq!(config.dashboard.theme, "mono");
        assert_eq!(
            config.dashboard.log_file,
            PathBuf::from("/tmp/metrik-dashboard.log")
        );
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.general.interval_ms, 10_000);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&path);
        assert_eq!(config.general.interval_ms, 10_000);
    }
}
