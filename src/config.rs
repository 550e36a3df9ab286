use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::connectors::file::utils::{ExtensionFilter, DEFAULT_ACCEPTED_EXTENSIONS};
use crate::connectors::file::INDEX_BATCH_SIZE;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "FILEINGEST_CONFIG";

/// Environment variable overriding `connector.batch_size`
pub const BATCH_SIZE_ENV: &str = "INDEX_BATCH_SIZE";

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// File connector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    /// Documents per emitted batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Member extensions that get indexed, with or without the leading dot
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            accepted_extensions: default_accepted_extensions(),
        }
    }
}

impl ConnectorConfig {
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.accepted_extensions)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_batch_size() -> usize {
    INDEX_BATCH_SIZE
}

fn default_accepted_extensions() -> Vec<String> {
    DEFAULT_ACCEPTED_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for the config file in this order:
    /// 1. Path specified in FILEINGEST_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory (defaults are used when absent)
    ///
    /// INDEX_BATCH_SIZE, when set, overrides `connector.batch_size`.
    pub fn load() -> Result<Self> {
        // Optional; a missing .env is not an error
        let _ = dotenv::dotenv();

        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Read and parse a TOML config file without validating it
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        toml::from_str(config_str).context("Invalid TOML configuration")
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(BATCH_SIZE_ENV) {
            self.connector.batch_size = value.trim().parse().with_context(|| {
                format!("{} must be a positive integer, got '{}'", BATCH_SIZE_ENV, value)
            })?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.connector.batch_size == 0 {
            anyhow::bail!("connector.batch_size must be greater than 0");
        }

        if self.connector.extension_filter().is_empty() {
            anyhow::bail!("connector.accepted_extensions must list at least one extension");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_env(config_path: Option<&Path>, batch_size: Option<&str>, f: impl FnOnce()) {
        let original_config = std::env::var(CONFIG_ENV).ok();
        let original_batch = std::env::var(BATCH_SIZE_ENV).ok();
        match config_path {
            Some(p) => std::env::set_var(CONFIG_ENV, p),
            None => std::env::remove_var(CONFIG_ENV),
        }
        match batch_size {
            Some(b) => std::env::set_var(BATCH_SIZE_ENV, b),
            None => std::env::remove_var(BATCH_SIZE_ENV),
        }
        f();
        std::env::remove_var(CONFIG_ENV);
        std::env::remove_var(BATCH_SIZE_ENV);
        if let Some(val) = original_config {
            std::env::set_var(CONFIG_ENV, val);
        }
        if let Some(val) = original_batch {
            std::env::set_var(BATCH_SIZE_ENV, val);
        }
    }

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.connector.batch_size, INDEX_BATCH_SIZE);
        assert_eq!(config.connector.accepted_extensions, default_accepted_extensions());
        assert_eq!(config.logging.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_toml() {
        let config = Config::from_toml_str(
            r#"
[connector]
batch_size = 4
accepted_extensions = ["txt", ".md"]

[logging]
log_level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.connector.batch_size, 4);
        let filter = config.connector.extension_filter();
        assert!(filter.check_file_ext_is_valid("a.md"));
        assert!(filter.check_file_ext_is_valid("a.txt"));
        assert!(!filter.check_file_ext_is_valid("a.log"));
        assert_eq!(config.logging.log_level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.connector.batch_size = 0;
        assert!(config.validate().unwrap_err().to_string().contains("batch_size"));

        let mut config = Config::default();
        config.connector.accepted_extensions = vec![" ".to_string()];
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("accepted_extensions"));
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ingest.toml");
        fs::write(&config_path, "[connector]\nbatch_size = 7\n").unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir);
        std::env::set_current_dir(temp_dir.path()).unwrap();

        with_env(Some(&config_path), None, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            assert_eq!(config.unwrap().connector.batch_size, 7);
        });
    }

    #[test]
    fn test_config_missing_explicit_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nonexistent.toml");

        with_env(Some(&missing), None, || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("Failed to read config file"));
        });
    }

    #[test]
    fn test_config_defaults_without_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir);
        std::env::set_current_dir(temp_dir.path()).unwrap();

        with_env(None, None, || {
            let config = Config::load().unwrap();
            assert_eq!(config.connector.batch_size, INDEX_BATCH_SIZE);
        });
    }

    #[test]
    fn test_batch_size_env_override() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[connector]\nbatch_size = 7\n").unwrap();

        with_env(Some(&config_path), Some("3"), || {
            assert_eq!(Config::load().unwrap().connector.batch_size, 3);
        });

        with_env(Some(&config_path), Some("zero"), || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains(BATCH_SIZE_ENV));
        });

        with_env(Some(&config_path), Some("0"), || {
            assert!(Config::load().is_err());
        });
    }
}
