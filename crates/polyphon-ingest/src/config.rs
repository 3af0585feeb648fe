use anyhow::{Context, Result};
use confyg::{env, Confygery};
use polyphon_core::{IndexOptions, SourcePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for polyphon.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (POLY_* prefix)
/// 3. Config file (~/.config/polyphon/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite index.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: POLY_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/polyphon/polyphon.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// How long a writer waits for the database lock, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Abort ingestion on the first malformed feed entry.
    #[serde(default)]
    pub fail_fast: bool,

    /// Log level used when `--verbose` is not given.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_coloured")]
    pub log_coloured: bool,

    /// Source name to priority (higher wins) when choosing current values.
    #[serde(default)]
    pub source_priority: BTreeMap<String, u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            fail_fast: false,
            log_level: default_log_level(),
            log_coloured: default_log_coloured(),
            source_priority: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/polyphon/config.toml
    /// Reads environment variables with POLY_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("poly");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Connection options for opening the index.
    #[must_use]
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    /// Merge policy built from `source_priority`.
    #[must_use]
    pub fn source_policy(&self) -> SourcePolicy {
        SourcePolicy {
            source_priority: self.source_priority.clone(),
        }
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/polyphon/polyphon.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("polyphon")
        .join("polyphon.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_log_coloured() -> bool {
    true
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/polyphon/config.toml
/// - macOS: ~/Library/Application Support/polyphon/config.toml
/// - Windows: %APPDATA%\polyphon\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("polyphon")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Polyphon Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (POLY_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite index
#
# Can also be set via:
# - CLI: polyphon --db /custom/path.db ingest feed.jsonl
# - Environment: POLY_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/polyphon.db"

# Milliseconds a writer waits for the database lock before giving up
busy_timeout_ms = 5000

# Stop ingesting at the first malformed feed entry instead of skipping it
fail_fast = false

# Log level when --verbose is not given: error, warn, info, debug, trace
log_level = "info"
log_coloured = true

# Priority of each source when choosing the current value of a field.
# Higher wins; unknown sources score 0; ties go to the latest ingested claim.
[source_priority]
ernImport = 100
cwr = 90
musicbrainz = 50
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.database_path.as_os_str().is_empty());
        assert_eq!(config.busy_timeout_ms, 5000);
        assert!(!config.fail_fast);
        assert_eq!(config.log_level, "info");
        assert!(config.source_priority.is_empty());
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_with_custom_db_path() {
        let custom_path = PathBuf::from("/tmp/test.db");
        let config = Config::load_with_db_path(custom_path.clone());
        assert!(config.is_ok());
        assert_eq!(config.unwrap().database_path, custom_path);
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.source_policy().priority_for("ERNIMPORT"), 100);
        assert_eq!(config.source_policy().priority_for("unknown"), 0);
    }

    #[test]
    fn test_index_options_from_config() {
        let config = Config {
            busy_timeout_ms: 250,
            ..Config::default()
        };
        assert_eq!(
            config.index_options().busy_timeout,
            Duration::from_millis(250)
        );
    }
}
