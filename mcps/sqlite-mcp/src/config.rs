//! Configuration for the SQLite MCP server

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// SQLite MCP configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SqliteConfig {
    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Open the database read-only and refuse every write operation
    /// Default: false
    #[serde(default)]
    pub read_only: bool,

    /// Create the file (and its parent directories) when it does not exist
    /// Default: true
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    /// How long a statement waits on a locked database, in seconds
    /// Default: 30
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_path() -> PathBuf {
    PathBuf::from("./db/default.db")
}

fn default_create_if_missing() -> bool {
    true
}

fn default_busy_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            read_only: false,
            create_if_missing: default_create_if_missing(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Level for this crate when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl SqliteConfig {
    /// Load configuration
    ///
    /// Looks for config in:
    /// 1. `explicit` (from `--config` or `SQLITE_MCP_CONFIG`)
    /// 2. `~/.binks/sqlite.toml`
    ///
    /// Falls back to defaults only when no file exists; a file that exists
    /// but does not parse is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".binks").join("sqlite.toml"))
    }

    /// Create a default config pointing to a specific database
    pub fn with_database(path: PathBuf) -> Self {
        Self {
            database: DatabaseConfig {
                path,
                ..DatabaseConfig::default()
            },
            ..Self::default()
        }
    }
}
