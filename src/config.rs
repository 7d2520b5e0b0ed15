use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Per-request timeout in seconds, applied to feed and page fetches.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

/// Connection details for the CouchDB document store used by `persist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| Error::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Without one the default location is
    /// tried and silently skipped when absent. Environment overrides
    /// (including a `.env` file) are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        // A missing .env file is the normal case
        let _ = dotenvy::dotenv();

        match path {
            Some(path) => Self::load_with_env(path),
            None => {
                let default_path = Self::config_dir()?.join("config.toml");
                if default_path.exists() {
                    Self::load_with_env(default_path)
                } else {
                    let mut config = Self::default();
                    config.apply_env_overrides();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.settings.timeout == 0 {
            return Err(Error::Config("Timeout must be greater than 0".to_string()));
        }

        url::Url::parse(&self.store.url)
            .map_err(|_| Error::InvalidUrl(self.store.url.clone()))?;

        if self.store.database.trim().is_empty() {
            return Err(Error::Config("Store database name cannot be empty".to_string()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = std::env::var("FEED_SCAN_TIMEOUT") {
            if let Ok(val) = timeout.parse() {
                self.settings.timeout = val;
            }
        }

        if let Ok(level) = std::env::var("FEED_SCAN_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(url) = std::env::var("FEED_SCAN_COUCH_URL") {
            self.store.url = url;
        }

        if let Ok(database) = std::env::var("FEED_SCAN_COUCH_DB") {
            self.store.database = database;
        }

        if let Ok(username) = std::env::var("FEED_SCAN_COUCH_USER") {
            self.store.username = Some(username);
        }

        if let Ok(password) = std::env::var("FEED_SCAN_COUCH_PASSWORD") {
            self.store.password = Some(password);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout)
    }

    pub fn config_dir() -> Result<PathBuf> {
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(config_home).join("feed-scan"));
        }

        dirs::config_dir()
            .map(|dir| dir.join("feed-scan"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            database: default_database(),
            username: None,
            password: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_timeout() -> u64 { 30 }
fn default_user_agent() -> String {
    format!("feed-scan/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_redirects() -> usize { 10 }

fn default_store_url() -> String { "http://localhost:5984".to_string() }
fn default_database() -> String { "feed_text".to_string() }

fn default_log_level() -> String { "warn".to_string() }
