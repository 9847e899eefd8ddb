use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::Locale;

const APP_DIR: &str = "akademi";
const DEFAULT_DB_NAME: &str = "akademi.db";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DB_ENV_VAR: &str = "AKADEMI_DB";
pub const CONFIG_ENV_VAR: &str = "AKADEMI_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub log_level: Option<String>,
    pub default_locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: 5000,
            log_level: None,
            default_locale: Locale::En,
        }
    }
}

impl Config {
    /// Loads the config file named by `AKADEMI_CONFIG`, or the one in the
    /// user config dir. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = match std::env::var(CONFIG_ENV_VAR) {
            Ok(p) => PathBuf::from(p),
            Err(_) => app_dir().join(CONFIG_FILE_NAME),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    // Env var wins over the config file, which wins over the default location
    pub fn db_path(&self) -> PathBuf {
        self.resolve_db_path(std::env::var(DB_ENV_VAR).ok())
    }

    fn resolve_db_path(&self, env_override: Option<String>) -> PathBuf {
        if let Some(path) = env_override {
            return PathBuf::from(path);
        }

        if let Some(path) = &self.database_path {
            return path.clone();
        }

        let dir = app_dir();
        std::fs::create_dir_all(&dir).ok();
        dir.join(DEFAULT_DB_NAME)
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
