//! Configuration file handling.
//!
//! Settings come from `ministry-report.yaml` in the working directory, or
//! from the file named by `MINISTRY_REPORT_CONFIG`. Every field has a
//! default, so a missing file or a partial one is fine. A few environment
//! variables override the file:
//!
//! - `MINISTRY_REPORT_DATA_DIR`: storage directory
//! - `MINISTRY_REPORT_BIND`: listen address

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::retry::{RetryPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS};
use crate::storage::CsvConnection;

pub const DEFAULT_CONFIG_FILE: &str = "ministry-report.yaml";
pub const CONFIG_PATH_ENV: &str = "MINISTRY_REPORT_CONFIG";
pub const DATA_DIR_ENV: &str = "MINISTRY_REPORT_DATA_DIR";
pub const BIND_ENV: &str = "MINISTRY_REPORT_BIND";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the REST API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origin allowed by CORS (the web frontend).
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_allowed_origin() -> String {
    "http://localhost:8080".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory; `~/Documents/Ministry Report` when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Printed at the top of every export.
    #[serde(default = "default_congregation_name")]
    pub congregation_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            congregation_name: default_congregation_name(),
        }
    }
}

fn default_congregation_name() -> String {
    "Congregation".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Attempts per storage write, including the first.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,

    /// Backoff before the first retry, doubled on each further retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: default_max_write_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_write_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve the configuration for this process: the file named by
    /// `MINISTRY_REPORT_CONFIG` (which must exist), else
    /// `ministry-report.yaml` if present, else defaults; then environment
    /// overrides.
    pub fn from_environment() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim()))?,
            _ => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)?
                } else {
                    info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Config::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides looked up by variable name. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = value(DATA_DIR_ENV) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(bind) = value(BIND_ENV) {
            self.server.bind_addr = bind;
        }
    }

    /// Directory the storage layer writes to.
    pub fn data_directory(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => CsvConnection::default_data_directory(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.sync.max_write_attempts,
            Duration::from_millis(self.sync.retry_backoff_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.sync.max_write_attempts, 3);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
report:
  congregation_name: "Congregação Central"
sync:
  max_write_attempts: 5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.report.congregation_name, "Congregação Central");
        assert_eq!(config.sync.max_write_attempts, 5);
        assert_eq!(config.sync.retry_backoff_ms, 100);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "storage:\n  data_dir: /srv/reports\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.data_directory().unwrap(), PathBuf::from("/srv/reports"));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "sync: [not, a, map]").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = [(DATA_DIR_ENV, " /tmp/reports "), (BIND_ENV, "")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/reports")));
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
    }
}
